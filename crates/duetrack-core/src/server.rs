//! HTTP trigger for the due-date sweep.
//!
//! A deliberately small loopback-style listener: a scheduler (cron, systemd
//! timer) hits `/sweep` and gets `{"updated":N}` back. One request per
//! connection, no keep-alive, no framework.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use chrono::Utc;

use crate::error::Result;
use crate::storage::LedgerDb;
use crate::sweep::run_sweep;

/// Status line and JSON body for one request.
#[derive(Debug, PartialEq, Eq)]
pub struct SweepResponse {
    pub status: u16,
    pub body: String,
}

/// Route a single request against the ledger.
///
/// `GET` or `POST` on `/sweep` runs the sweep; anything else is a 404.
/// Sweep failures answer 500 so the scheduler's next tick retries.
pub fn handle_request(db: &LedgerDb, method: &str, path: &str) -> SweepResponse {
    let path = path.split('?').next().unwrap_or(path);
    if path != "/sweep" || !matches!(method, "GET" | "POST") {
        return SweepResponse {
            status: 404,
            body: r#"{"error":"not found"}"#.to_string(),
        };
    }

    match run_sweep(db, Utc::now()) {
        Ok(report) => SweepResponse {
            status: 200,
            body: format!(r#"{{"updated":{}}}"#, report.updated),
        },
        Err(e) => {
            log::error!("sweep trigger failed: {e}");
            SweepResponse {
                status: 500,
                body: r#"{"error":"sweep failed"}"#.to_string(),
            }
        }
    }
}

/// Serve sweep triggers until the process is stopped.
pub fn serve(db: &LedgerDb, bind: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind((bind, port))?;
    log::info!("sweep trigger listening on {bind}:{port}");

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(e) = handle_connection(&mut stream, db) {
                    log::warn!("sweep trigger connection error: {e}");
                }
            }
            Err(e) => log::warn!("sweep trigger accept error: {e}"),
        }
    }
    Ok(())
}

fn handle_connection(stream: &mut TcpStream, db: &LedgerDb) -> std::io::Result<()> {
    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf)?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");

    let response = handle_request(db, method, path);
    let reason = match response.status {
        200 => "OK",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason,
        response.body.len(),
        response.body
    )
}
