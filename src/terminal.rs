//! Terminal display surface for the `vahana` binary.

use vahana::{
    ResponseStatus, Role, Session, SurfaceEvent, TelemetrySnapshot, User, VahanaError,
    VehicleCommand,
};

/// Print a surface event.
pub fn render(event: &SurfaceEvent) {
    match event {
        SurfaceEvent::Telemetry(snapshot) => println!("{}", format_telemetry(snapshot)),
        SurfaceEvent::Response { status, message } => {
            println!("[{}] {}", response_title(*status), message);
        }
        SurfaceEvent::UserList(users) => print!("{}", format_user_list(users)),
        SurfaceEvent::Disconnected => println!("Disconnected from server"),
    }
}

pub fn render_error(error: &VahanaError) {
    eprintln!("Error: {}", error);
}

pub fn banner(session: &Session) {
    println!(
        "Connected to {}:{} as {} ({})",
        session.host(),
        session.port(),
        session.username(),
        session.role()
    );
    if session.role() == Role::Admin {
        let commands = [
            VehicleCommand::SpeedUp,
            VehicleCommand::SlowDown,
            VehicleCommand::TurnLeft,
            VehicleCommand::TurnRight,
            VehicleCommand::ListUsers,
        ];
        let names: Vec<String> = commands.iter().map(ToString::to_string).collect();
        println!("Commands: {}", names.join(", "));
    }
}

fn format_telemetry(snapshot: &TelemetrySnapshot) -> String {
    format!(
        "speed {:>6.1} km/h | battery {:>3}% | temp {:>5.1}°C | heading {}",
        snapshot.speed, snapshot.battery, snapshot.temperature, snapshot.direction
    )
}

fn response_title(status: ResponseStatus) -> &'static str {
    match status {
        ResponseStatus::Ok => "Success",
        ResponseStatus::Denied => "Command Denied",
        ResponseStatus::Error => "Error",
    }
}

fn format_user_list(users: &[User]) -> String {
    let mut out = format!("Connected users ({}):\n", users.len());
    for user in users {
        out.push_str(&format!(
            "  {} ({}) - {}\n",
            user.username, user.role, user.address
        ));
    }
    out
}
