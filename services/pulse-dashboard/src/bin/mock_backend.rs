//! Mock push backend for testing
//!
//! A simple mock push server that accepts a subscribe line and replays a
//! scripted sequence of frames for the requested channel. Used for testing
//! the stream client end to end.
//!
//! Usage:
//!   mock_backend [--port PORT]
//!
//! The port can also be set via the MOCK_BACKEND_PORT environment variable.
//! Command line argument takes precedence over environment variable.
//! Default port is 8001.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

fn main() {
    // Port priority: command line arg > environment variable > default (8001)
    let port = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .or_else(|| {
            std::env::var("MOCK_BACKEND_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
        })
        .unwrap_or(8001u16);

    let listener = match TcpListener::bind(format!("127.0.0.1:{}", port)) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to port {}: {}", port, e);
            std::process::exit(1);
        }
    };

    eprintln!("Mock backend listening on port {}", port);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                std::thread::spawn(move || {
                    handle_client(stream);
                });
            }
            Err(e) => {
                eprintln!("Accept error: {}", e);
            }
        }
    }
}

fn handle_client(stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    eprintln!("Connection from {}", peer);

    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });
    let mut writer = stream;

    // First line is the subscribe path: "<channel>/<organization_id>"
    let mut subscribe = String::new();
    if reader.read_line(&mut subscribe).is_err() {
        return;
    }
    let subscribe = subscribe.trim();
    eprintln!("Subscribed: {}", subscribe);

    let frames: &[&str] = if subscribe.starts_with("monitors/") {
        monitor_script()
    } else if subscribe.starts_with("incidents/") {
        incident_script()
    } else {
        eprintln!("Unknown subscription: {}", subscribe);
        return;
    };

    for frame in frames {
        if writeln!(writer, "{}", frame).is_err() {
            break;
        }
        if writer.flush().is_err() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    // Hold the connection open until the client hangs up
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }

    eprintln!("Client disconnected");
}

fn monitor_script() -> &'static [&'static str] {
    &[
        // Normal result
        r#"{"type":"monitor_update","payload":{"id":"m-1","name":"API","url":"https://api.example.com/health","method":"GET","interval":60,"active":true,"serviceId":"s-1","latestResult":{"status":"UP","responseTimeMs":42,"httpStatusCode":200}}}"#,
        // Pending tick: latest result present, response time null
        r#"{"type":"monitor_update","payload":{"id":"m-1","name":"API","url":"https://api.example.com/health","method":"GET","interval":60,"active":true,"serviceId":"s-1","latestResult":{"status":null,"responseTimeMs":null}}}"#,
        // Unknown frame type
        r#"{"type":"maintenance_started","payload":{}}"#,
        // Degraded result
        r#"{"type":"monitor_update","payload":{"id":"m-1","name":"API","url":"https://api.example.com/health","method":"GET","interval":60,"active":true,"serviceId":"s-1","latestResult":{"status":"DEGRADED","responseTimeMs":2400,"httpStatusCode":200}}}"#,
    ]
}

fn incident_script() -> &'static [&'static str] {
    &[
        r#"{"type":"incident_created","payload":{"id":"i-1","organizationId":"org-1","title":"API outage","status":"OPEN","severity":"MEDIUM","affectedServiceIds":["s-1"],"createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:00:00Z"}}"#,
        r#"{"type":"incident_updated","payload":{"id":"i-1","organizationId":"org-1","title":"API outage","status":"OPEN","severity":"CRITICAL","affectedServiceIds":["s-1"],"createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:05:00Z"}}"#,
        r#"{"type":"incident_resolved","payload":{"id":"i-1","organizationId":"org-1","title":"API outage","status":"RESOLVED","severity":"CRITICAL","affectedServiceIds":["s-1"],"createdAt":"2026-01-01T00:00:00Z","updatedAt":"2026-01-01T00:30:00Z","resolvedAt":"2026-01-01T00:30:00Z"}}"#,
    ]
}
