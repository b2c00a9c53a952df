//! End-to-end session tests against a scripted loopback server.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use approx::assert_relative_eq;
use crossbeam_channel::Receiver;
use vahana::{
    ChannelSurface, Credentials, Direction, ResponseStatus, Role, Session, SessionStatus,
    SurfaceEvent, VahanaError, VehicleCommand,
};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Accept one client, read its AUTH line, then hand the connection to `script`.
///
/// The join handle yields the AUTH line and whatever the script returns.
fn spawn_server<T, F>(script: F) -> (u16, JoinHandle<(String, T)>)
where
    T: Send + 'static,
    F: FnOnce(&mut BufReader<TcpStream>, &mut TcpStream) -> T + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut auth = String::new();
        reader.read_line(&mut auth).unwrap();
        let result = script(&mut reader, &mut writer);
        (auth, result)
    });
    (port, handle)
}

fn credentials(port: u16, role: Role) -> Credentials {
    Credentials {
        host: "127.0.0.1".to_string(),
        port,
        username: "alice".to_string(),
        password: "s3cret".to_string(),
        role,
    }
}

fn connect(port: u16, role: Role) -> (vahana::Result<Session>, Receiver<SurfaceEvent>) {
    let (surface, events) = ChannelSurface::new();
    (
        Session::connect(&credentials(port, role), Arc::new(surface)),
        events,
    )
}

fn next_event(events: &Receiver<SurfaceEvent>) -> SurfaceEvent {
    events.recv_timeout(EVENT_TIMEOUT).expect("no surface event")
}

/// Block until the client closes its side.
fn wait_for_eof(reader: &mut BufReader<TcpStream>) {
    let mut line = String::new();
    while matches!(reader.read_line(&mut line), Ok(n) if n > 0) {
        line.clear();
    }
}

#[test]
fn test_handshake_and_telemetry() {
    let (port, server) = spawn_server(|reader, writer| {
        writer
            .write_all(b"RESP|OK:Welcome alice\nTELEM|12.5:80:21.0:NORTH\n")
            .unwrap();
        wait_for_eof(reader);
    });

    let (session, events) = connect(port, Role::Admin);
    let session = session.unwrap();
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert!(session.is_connected());

    let SurfaceEvent::Telemetry(snapshot) = next_event(&events) else {
        panic!("Expected telemetry");
    };
    assert_relative_eq!(snapshot.speed, 12.5);
    assert_eq!(snapshot.battery, 80);
    assert_relative_eq!(snapshot.temperature, 21.0);
    assert_eq!(snapshot.direction, Direction::North);

    let latest = session.latest_telemetry().unwrap();
    assert_eq!(*latest, *snapshot);

    session.disconnect();
    assert_eq!(next_event(&events), SurfaceEvent::Disconnected);
    session.wait();

    let (auth, ()) = server.join().unwrap();
    assert_eq!(auth, "AUTH|ADMIN:alice:s3cret\n");
}

#[test]
fn test_denied_handshake() {
    let (port, server) = spawn_server(|_, writer| {
        writer
            .write_all(b"RESP|DENIED:Invalid credentials\n")
            .unwrap();
    });

    let (session, events) = connect(port, Role::Observer);
    match session {
        Err(VahanaError::Authentication(reason)) => assert_eq!(reason, "Invalid credentials"),
        other => panic!("Expected authentication error, got {:?}", other),
    }
    // A failed handshake never reaches the display surface
    assert!(events.recv_timeout(QUIET_PERIOD).is_err());

    let (auth, ()) = server.join().unwrap();
    assert_eq!(auth, "AUTH|OBSERVER:alice:s3cret\n");
}

#[test]
fn test_unexpected_handshake_reply() {
    let (port, server) = spawn_server(|_, writer| {
        writer.write_all(b"TELEM|1.0:2:3.0:EAST\n").unwrap();
    });

    let (session, _events) = connect(port, Role::Admin);
    assert!(matches!(session, Err(VahanaError::Authentication(_))));
    server.join().unwrap();
}

#[test]
fn test_blank_first_line_fails_handshake() {
    let (port, server) = spawn_server(|_, writer| {
        writer.write_all(b"\nRESP|OK:hi\n").unwrap();
    });

    let (session, events) = connect(port, Role::Admin);
    assert!(matches!(session, Err(VahanaError::Authentication(_))));
    assert!(events.recv_timeout(QUIET_PERIOD).is_err());
    server.join().unwrap();
}

#[test]
fn test_server_closes_during_handshake() {
    let (port, server) = spawn_server(|_, _| ());

    let (session, _events) = connect(port, Role::Admin);
    match session {
        Err(VahanaError::Authentication(reason)) => {
            assert_eq!(reason, "Connection closed during handshake")
        }
        other => panic!("Expected authentication error, got {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let (session, _events) = connect(port, Role::Admin);
    assert!(matches!(session, Err(VahanaError::Network(_))));
}

#[test]
fn test_bytes_after_handshake_reply_are_dispatched() {
    let (port, server) = spawn_server(|reader, writer| {
        writer
            .write_all(b"RESP|OK:hi\nTELEM|1.0:50:20.0:EAST\nRESP|OK:done\n")
            .unwrap();
        wait_for_eof(reader);
    });

    let (session, events) = connect(port, Role::Admin);
    let session = session.unwrap();

    assert!(matches!(next_event(&events), SurfaceEvent::Telemetry(_)));
    assert_eq!(
        next_event(&events),
        SurfaceEvent::Response {
            status: ResponseStatus::Ok,
            message: "done".to_string(),
        }
    );

    session.disconnect();
    server.join().unwrap();
}

#[test]
fn test_split_and_merged_frames() {
    let (port, server) = spawn_server(|reader, writer| {
        writer.write_all(b"RESP|OK:hi\n").unwrap();
        writer.write_all(b"TELEM|5.0:9").unwrap();
        writer.flush().unwrap();
        thread::sleep(Duration::from_millis(50));
        writer
            .write_all(b"0:30.5:SOUTH\nRESP|ERROR:Unknown command\nLIST|1:bob-OBSERVER-10.0.0.2:5555\n")
            .unwrap();
        wait_for_eof(reader);
    });

    let (session, events) = connect(port, Role::Admin);
    let session = session.unwrap();

    let SurfaceEvent::Telemetry(snapshot) = next_event(&events) else {
        panic!("Expected telemetry");
    };
    assert_eq!(snapshot.battery, 90);
    assert_relative_eq!(snapshot.temperature, 30.5);
    assert_eq!(snapshot.direction, Direction::South);

    assert_eq!(
        next_event(&events),
        SurfaceEvent::Response {
            status: ResponseStatus::Error,
            message: "Unknown command".to_string(),
        }
    );

    let SurfaceEvent::UserList(users) = next_event(&events) else {
        panic!("Expected user list");
    };
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "bob");
    assert_eq!(users[0].role, "OBSERVER");
    assert_eq!(users[0].address, "10.0.0.2");

    session.disconnect();
    server.join().unwrap();
}

#[test]
fn test_bad_frames_do_not_end_the_session() {
    let (port, server) = spawn_server(|reader, writer| {
        writer
            .write_all(b"RESP|OK:hi\nTELEM|abc:1:2.0:NORTH\nGARBAGE\nTELEM|1.0:2:3.0:WEST\n")
            .unwrap();
        wait_for_eof(reader);
    });

    let (session, events) = connect(port, Role::Admin);
    let session = session.unwrap();

    let SurfaceEvent::Telemetry(snapshot) = next_event(&events) else {
        panic!("Expected telemetry");
    };
    assert_eq!(snapshot.direction, Direction::West);
    assert_eq!(session.stats().dropped, 2);
    assert!(session.is_connected());

    session.disconnect();
    server.join().unwrap();
}

#[test]
fn test_admin_command_bytes() {
    let (port, server) = spawn_server(|reader, writer| {
        writer.write_all(b"RESP|OK:hi\n").unwrap();
        let mut first = String::new();
        reader.read_line(&mut first).unwrap();
        let mut second = String::new();
        reader.read_line(&mut second).unwrap();
        wait_for_eof(reader);
        (first, second)
    });

    let (session, _events) = connect(port, Role::Admin);
    let session = session.unwrap();
    session.send_command(VehicleCommand::SpeedUp).unwrap();
    session.send_command("LIST USERS").unwrap();
    session.disconnect();

    let (_, (first, second)) = server.join().unwrap();
    assert_eq!(first, "CMD|SPEED UP\n");
    assert_eq!(second, "CMD|LIST USERS\n");
}

#[test]
fn test_observer_commands_never_reach_the_server() {
    let (port, server) = spawn_server(|reader, writer| {
        writer.write_all(b"RESP|OK:hi\n").unwrap();
        reader.get_ref().set_read_timeout(Some(QUIET_PERIOD)).unwrap();
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Err(e) => matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
            Ok(_) => false,
        }
    });

    let (session, _events) = connect(port, Role::Observer);
    let session = session.unwrap();
    assert!(matches!(
        session.send_command(VehicleCommand::TurnLeft),
        Err(VahanaError::PermissionDenied(_))
    ));
    assert!(session.is_connected());

    let (_, silent) = server.join().unwrap();
    assert!(silent, "observer command reached the server");
    session.disconnect();
}

#[test]
fn test_command_with_line_break_is_rejected() {
    let (port, server) = spawn_server(|reader, writer| {
        writer.write_all(b"RESP|OK:hi\n").unwrap();
        wait_for_eof(reader);
    });

    let (session, _events) = connect(port, Role::Admin);
    let session = session.unwrap();
    assert!(matches!(
        session.send_command("SPEED UP\nCMD|TURN LEFT"),
        Err(VahanaError::Protocol(_))
    ));

    session.disconnect();
    server.join().unwrap();
}

#[test]
fn test_server_close_notifies_once() {
    let (port, server) = spawn_server(|_, writer| {
        writer.write_all(b"RESP|OK:hi\n").unwrap();
    });

    let (session, events) = connect(port, Role::Admin);
    let session = Arc::new(session.unwrap());
    server.join().unwrap();

    // Race explicit disconnects against the connection loss
    let racers: Vec<_> = (0..4)
        .map(|_| {
            let session = Arc::clone(&session);
            thread::spawn(move || session.disconnect())
        })
        .collect();
    for racer in racers {
        racer.join().unwrap();
    }

    assert_eq!(next_event(&events), SurfaceEvent::Disconnected);
    assert!(events.recv_timeout(QUIET_PERIOD).is_err());

    session.wait();
    assert_eq!(session.status(), SessionStatus::Disconnected);
    assert!(!session.is_connected());
}

#[test]
fn test_send_after_disconnect() {
    let (port, server) = spawn_server(|reader, writer| {
        writer.write_all(b"RESP|OK:hi\n").unwrap();
        wait_for_eof(reader);
    });

    let (session, events) = connect(port, Role::Admin);
    let session = session.unwrap();
    session.disconnect();
    session.disconnect();
    session.wait();

    assert_eq!(next_event(&events), SurfaceEvent::Disconnected);
    assert!(events.recv_timeout(QUIET_PERIOD).is_err());
    assert!(matches!(
        session.send_command(VehicleCommand::SlowDown),
        Err(VahanaError::Network(_))
    ));
    server.join().unwrap();
}

#[test]
fn test_drop_disconnects() {
    let (port, server) = spawn_server(|reader, writer| {
        writer.write_all(b"RESP|OK:hi\n").unwrap();
        wait_for_eof(reader);
    });

    let (session, events) = connect(port, Role::Observer);
    drop(session.unwrap());

    assert_eq!(next_event(&events), SurfaceEvent::Disconnected);
    server.join().unwrap();
}
