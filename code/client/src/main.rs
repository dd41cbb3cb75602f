// This file defines the command-line client for the terrarium monitor server.
//
// It can show the terrarium's status, read and change the control flags (lamp,
// servo, soil threshold), and post a sensor reading the same way the
// microcontroller does.

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fmt;
use std::sync::LazyLock;
use terralib::status::print_status_report;
use terralib::types::{
    ControlState, Document, LAMP, SERVO, SensorReading, StatusReport, Switch, THRESHOLD,
};

#[derive(Parser, Debug)]
#[command(about = "Terrarium monitor command-line client")]
struct Args {
    #[arg(long, help = "Server address, host:port")]
    addr: Option<String>,

    #[command(subcommand)]
    command: Commands,

    #[arg(long, help = "If true, output is printed in json format")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show sensor readings, their status, and the overall terrarium condition.
    Status,
    /// Show the current control flags.
    Control,
    /// Change control flags. Takes assignments like `lamp=on servo=off threshold=2000`.
    Set {
        #[arg(required = true, help = "A list of assignments of the form <key>=<value>")]
        assignments: Vec<String>,
    },
    /// Post a sensor reading, as the microcontroller would.
    Push {
        temperature: f64,
        humidity: f64,
        lux: f64,
        soil: i64,
    },
}

// Body of the server's success/error replies.
#[derive(Deserialize, Debug)]
struct Reply {
    status: String,
    message: Option<String>,
    updated_data: Option<Document>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stderrlog::new()
        .module(module_path!())
        .verbosity(log::Level::Info)
        .init()?;

    let args = Args::parse();

    // The server address can be passed by flag or environment variable. Flag
    // takes precedence.
    let addr = args
        .addr
        .or(env::var("TERRARIUM_ADDR").ok())
        .ok_or_else(|| anyhow!("No address specified. Either pass --addr or set TERRARIUM_ADDR env var."))?;

    log::info!("Connecting to terrarium server at '{addr}'...");
    let client = reqwest::Client::new();

    match &args.command {
        Commands::Status => {
            let resp = client.get(format!("http://{addr}/status")).send().await?;
            let text = check_ok(resp).await?;
            if args.json {
                println!("{text}");
            } else {
                let report: StatusReport = serde_json::from_str(&text)?;
                println!("Terrarium Status:");
                println!("=================");
                print_status_report(&report);
                print_control(&ControlState::decode(&report.control_data));
            }
        }
        Commands::Control => {
            let resp = client
                .get(format!("http://{addr}/get-control"))
                .send()
                .await?;
            let text = check_ok(resp).await?;
            if args.json {
                println!("{text}");
            } else {
                let doc: Document = serde_json::from_str(&text)?;
                print_control(&ControlState::decode(&doc));
            }
        }
        Commands::Set { assignments } => {
            let update = create_update(assignments)?;
            let resp = client
                .post(format!("http://{addr}/update_control"))
                .json(&update)
                .send()
                .await?;
            let text = check_ok(resp).await?;
            let reply: Reply = serde_json::from_str(&text)?;
            if args.json {
                println!("{text}");
            } else if let Some(doc) = reply.updated_data {
                print_control(&ControlState::decode(&doc));
            }
        }
        Commands::Push {
            temperature,
            humidity,
            lux,
            soil,
        } => {
            let reading = SensorReading {
                temperature: *temperature,
                humidity: *humidity,
                lux: *lux,
                soil: *soil,
            };
            let resp = client
                .post(format!("http://{addr}/data"))
                .json(&reading)
                .send()
                .await?;
            let text = check_ok(resp).await?;
            let reply: Reply = serde_json::from_str(&text)?;
            log::info!(
                "Server replied {}: {}",
                reply.status,
                reply.message.unwrap_or_default()
            );
        }
    }

    Ok(())
}

// Returns the response body, or an error carrying the server's message if the
// request didn't succeed.
async fn check_ok(resp: reqwest::Response) -> anyhow::Result<String> {
    let status = resp.status();
    let text = resp.text().await?;
    if status != StatusCode::OK {
        let message = serde_json::from_str::<Reply>(&text)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or(text);
        return Err(anyhow!("Got bad response ({status}): {message}"));
    }
    Ok(text)
}

fn print_control(control: &ControlState) {
    println!("Lamp:      {}", control.lamp);
    println!("Servo:     {}", control.servo);
    println!("Threshold: {}", control.threshold);
}

fn create_update(assignments: &[String]) -> anyhow::Result<Document> {
    let mut update = Document::new();
    for a in assignments {
        let (key, value) = parse_assignment(a).map_err(|err| anyhow!("{err}"))?;
        update.insert(key.to_string(), value);
    }
    Ok(update)
}

static ASSIGNMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?<key>[a-zA-Z_]+)=(?<value>\S+)$").unwrap());

#[derive(PartialEq, Debug)]
struct AssignmentParseError {
    msg: String,
}

impl AssignmentParseError {
    pub fn new(msg: &str) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for AssignmentParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}

// Parses `<key>=<value>`. Switch values are normalized to ON/OFF so the
// device, which compares strings exactly, understands them.
fn parse_assignment(a: &str) -> Result<(&'static str, Value), AssignmentParseError> {
    let caps = match ASSIGNMENT_RE.captures(a) {
        Some(c) => c,
        None => {
            return Err(AssignmentParseError::new(&format!(
                "Invalid assignment: '{a}'"
            )));
        }
    };

    let key = caps.name("key").unwrap().as_str().to_lowercase();
    let value = caps.name("value").unwrap().as_str();

    match key.as_str() {
        LAMP | SERVO => {
            let switch: Switch = value
                .parse()
                .map_err(|err| AssignmentParseError::new(&format!("{key}: {err}")))?;
            let key = if key == LAMP { LAMP } else { SERVO };
            Ok((key, Value::String(switch.to_string())))
        }
        THRESHOLD => match value.parse::<i64>() {
            Ok(t) => Ok((THRESHOLD, Value::from(t))),
            Err(_) => Err(AssignmentParseError::new(&format!(
                "threshold must be an integer, got '{value}'"
            ))),
        },
        _ => Err(AssignmentParseError::new(&format!(
            "Unknown control key: '{key}'"
        ))),
    }
}

#[cfg(test)]
mod parse_assignment {
    use super::*;

    #[test]
    fn lamp_on() {
        assert_eq!(
            parse_assignment("lamp=on"),
            Ok((LAMP, Value::String("ON".into())))
        );
    }

    #[test]
    fn uppercase_key() {
        assert_eq!(
            parse_assignment("SERVO=Off"),
            Ok((SERVO, Value::String("OFF".into())))
        );
    }

    #[test]
    fn threshold() {
        assert_eq!(
            parse_assignment("threshold=1800"),
            Ok((THRESHOLD, Value::from(1800)))
        );
    }

    #[test]
    fn bad_threshold() {
        assert_eq!(
            parse_assignment("threshold=wet"),
            Err(AssignmentParseError::new(
                "threshold must be an integer, got 'wet'"
            ))
        );
    }

    #[test]
    fn bad_switch() {
        assert_eq!(
            parse_assignment("lamp=dim"),
            Err(AssignmentParseError::new(
                "lamp: Expected ON or OFF, got 'dim'"
            ))
        );
    }

    #[test]
    fn unknown_key() {
        assert_eq!(
            parse_assignment("fan=on"),
            Err(AssignmentParseError::new("Unknown control key: 'fan'"))
        );
    }

    #[test]
    fn shared_pattern() {
        assert!(ASSIGNMENT_RE.is_match("threshold=2000"));
        assert!(!ASSIGNMENT_RE.is_match("lamp = on"));
        // same compiled pattern reused across calls
        for _ in 0..3 {
            assert_eq!(
                parse_assignment("lamp=off"),
                Ok((LAMP, Value::String("OFF".into())))
            );
        }
    }

    #[test]
    fn invalid_assignment() {
        assert_eq!(
            parse_assignment("lamp"),
            Err(AssignmentParseError::new("Invalid assignment: 'lamp'"))
        );
    }
}

#[cfg(test)]
mod update {
    use super::*;

    #[test]
    fn create() {
        let update = create_update(&[
            "lamp=ON".to_string(),
            "threshold=2000".to_string(),
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            "{\"lamp\":\"ON\",\"threshold\":2000}".to_string()
        );
    }

    #[test]
    fn later_assignment_wins() {
        let update =
            create_update(&["servo=on".to_string(), "servo=off".to_string()]).unwrap();
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            "{\"servo\":\"OFF\"}".to_string()
        );
    }

    #[test]
    fn error_stops_update() {
        assert_eq!(
            create_update(&["lamp=on".to_string(), "x".to_string()])
                .unwrap_err()
                .to_string(),
            "Invalid assignment: 'x'"
        );
    }
}
