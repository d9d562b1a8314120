use ingest::{ingest_event, parse_json, Dispatch, UploadEvent};

fn main() {
    let notifications: [&[u8]; 3] = [
        br#"{"bucket": "b", "name": "reports/a.txt", "generation": "1718006400000000", "size": "34", "timeCreated": "2024-06-10T08:00:00.000Z"}"#,
        br#"{"bucket": "b", "name": "reports/"}"#,
        br#"{"name": "orphan.txt"}"#,
    ];

    for body in notifications {
        let event: UploadEvent = match parse_json(body) {
            Ok(event) => event,
            Err(err) => {
                println!("rejected: {err}");
                continue;
            }
        };
        match ingest_event(event) {
            Ok(Dispatch::Start(argument)) => match serde_json::to_string(&argument) {
                Ok(json) => println!("start workflow with {json}"),
                Err(err) => println!("unserializable argument: {err}"),
            },
            Ok(Dispatch::Skip(reason)) => println!("skipped: {reason}"),
            Err(err) => println!("rejected: {err}"),
        }
    }
}
