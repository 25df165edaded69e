use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use sim_client::{Client, RoadNetwork, SimError, Timestamp, WorldQuery};

const TIMEOUT: Duration = Duration::from_secs(2);

enum Reply {
    Ok(Value),
    Err(&'static str),
    WrongId(Value),
}

/// In-process stand-in for the simulator side of the line protocol.
/// Every accepted connection is served on its own thread.
fn spawn_bridge<H>(handler: H) -> u16
where
    H: Fn(&str, &Value) -> Reply + Send + Sync + Clone + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let handler = handler.clone();
            thread::spawn(move || serve(stream, handler));
        }
    });
    port
}

fn serve<H>(stream: TcpStream, handler: H)
where
    H: Fn(&str, &Value) -> Reply,
{
    let mut writer = stream.try_clone().unwrap();
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let Ok(line) = line else { return };
        let request: Value = serde_json::from_str(&line).unwrap();
        let id = request["id"].as_u64().unwrap();
        let method = request["method"].as_str().unwrap().to_string();

        if method == "subscribe_tick" {
            let ack = json!({ "id": id, "result": null });
            writeln!(writer, "{ack}").unwrap();
            for frame in 1.. {
                let tick = json!({
                    "frame": frame,
                    "elapsed_seconds": frame as f64 * 0.05,
                    "delta_seconds": 0.05,
                    "platform_timestamp": 1000.0 + frame as f64 * 0.05,
                });
                if writeln!(writer, "{tick}").is_err() {
                    return;
                }
                thread::sleep(Duration::from_millis(5));
            }
        }

        let response = match handler(&method, &request["params"]) {
            Reply::Ok(result) => json!({ "id": id, "result": result }),
            Reply::Err(message) => json!({ "id": id, "error": message }),
            Reply::WrongId(result) => json!({ "id": id + 100, "result": result }),
        };
        if writeln!(writer, "{response}").is_err() {
            return;
        }
    }
}

fn town_handler(method: &str, params: &Value) -> Reply {
    match method {
        "get_world" => Reply::Ok(json!({ "episode_id": 7, "map_name": "Town01" })),
        "get_actors" => Reply::Ok(json!([
            { "id": 1, "type_id": "vehicle.audi.tt", "location": { "x": 12.7, "y": -3.2, "z": 5.0 } },
            { "id": 2, "type_id": "traffic.traffic_light", "location": { "x": 40.0, "y": 8.0, "z": 0.0 } },
        ])),
        "get_map" => Reply::Ok(json!({ "name": "Town01" })),
        "generate_waypoints" => {
            let d = params["distance"].as_f64().unwrap();
            let point = |x: f64, y: f64| {
                json!({ "transform": { "location": { "x": x, "y": y, "z": 0.0 } } })
            };
            Reply::Ok(json!([point(0.0, 0.0), point(d, 0.0), point(d, d)]))
        }
        _ => Reply::Err("unknown method"),
    }
}

#[test]
fn queries_world_actors_and_waypoints() {
    let port = spawn_bridge(town_handler);
    let client = Client::connect("127.0.0.1", port, TIMEOUT).unwrap();
    assert_eq!(client.address(), format!("127.0.0.1:{port}"));

    let world = client.world().unwrap();
    assert_eq!(world.id(), 7);
    assert_eq!(world.info().map_name, "Town01");

    let actors = world.actors().unwrap();
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[0].type_id, "vehicle.audi.tt");
    assert_eq!(actors[0].location().x, 12.7);
    assert_eq!(actors[1].location().y, 8.0);

    let map = world.map().unwrap();
    assert_eq!(map.name(), "Town01");
    let waypoints = map.generate_waypoints(10.0).unwrap();
    let points: Vec<(f64, f64)> = waypoints
        .iter()
        .map(|w| (w.transform.location.x, w.transform.location.y))
        .collect();
    assert_eq!(points, vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
    assert_eq!(waypoints[0].transform.rotation.yaw, 0.0);
}

#[test]
fn server_errors_are_surfaced() {
    let port = spawn_bridge(|method, params| match method {
        "get_world" => town_handler(method, params),
        _ => Reply::Err("episode is loading"),
    });
    let world = Client::connect("127.0.0.1", port, TIMEOUT)
        .unwrap()
        .world()
        .unwrap();

    match world.actors() {
        Err(SimError::Server { method, message }) => {
            assert_eq!(method, "get_actors");
            assert_eq!(message, "episode is loading");
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[test]
fn mismatched_response_id_is_a_protocol_error() {
    let port = spawn_bridge(|method, params| match method {
        "get_actors" => Reply::WrongId(json!([])),
        _ => town_handler(method, params),
    });
    let world = Client::connect("127.0.0.1", port, TIMEOUT)
        .unwrap()
        .world()
        .unwrap();
    assert!(matches!(world.actors(), Err(SimError::Protocol(_))));
}

#[test]
fn refused_connection_fails_fast() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    match Client::connect("127.0.0.1", port, TIMEOUT) {
        Err(SimError::Connect { address, .. }) => {
            assert_eq!(address, format!("127.0.0.1:{port}"));
        }
        Err(other) => panic!("expected connect error, got {other}"),
        Ok(_) => panic!("connected to a closed port"),
    }
}

#[test]
fn unresolvable_host_is_reported() {
    let result = Client::connect("no-such-host.invalid", 2000, TIMEOUT);
    assert!(matches!(result, Err(SimError::Resolve { .. })));
}

#[test]
fn tick_subscription_delivers_until_cancelled() {
    let port = spawn_bridge(town_handler);
    let world = Client::connect("127.0.0.1", port, TIMEOUT)
        .unwrap()
        .world()
        .unwrap();

    let (tx, rx) = mpsc::channel::<Timestamp>();
    let mut subscription = world
        .on_tick(move |timestamp| {
            let _ = tx.send(timestamp);
        })
        .unwrap();

    let first = rx.recv_timeout(TIMEOUT).unwrap();
    let second = rx.recv_timeout(TIMEOUT).unwrap();
    assert!(second.frame > first.frame);
    assert_eq!(first.delta_seconds, 0.05);

    // Queries keep working while the tick stream runs on its own connection.
    assert_eq!(world.actors().unwrap().len(), 2);

    let token = subscription.token();
    subscription.cancel();
    assert!(!token.is_active());

    // The worker has been joined, so the callback and its sender are gone.
    while rx.try_recv().is_ok() {}
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(100)),
        Err(mpsc::RecvTimeoutError::Disconnected)
    );
}
