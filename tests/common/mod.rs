#![allow(dead_code)]
//! In-process mock OVSDB server for integration tests.
//!
//! Listens on a Unix socket inside a temporary directory and answers the
//! JSON-RPC methods the client uses, backed by a small fixed dataset.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

pub const DATABASE: &str = "Open_vSwitch";
pub const NB_DATABASE: &str = "OVN_Northbound";

pub const OVS_UUID: &str = "5f5ab0a4-4d3c-4a4b-9cf7-1a2b3c4d5e6f";
pub const BR_INT_UUID: &str = "0c1e6d37-3c0e-4a3e-9a57-2f0a4f4e9a01";
pub const BR_EX_UUID: &str = "7a1d2c3b-4e5f-4a6b-8c7d-9e0f1a2b3c4d";
pub const PORT_1_UUID: &str = "11111111-2222-4333-8444-555555555551";
pub const PORT_2_UUID: &str = "11111111-2222-4333-8444-555555555552";
pub const PORT_3_UUID: &str = "11111111-2222-4333-8444-555555555553";
pub const ACL_1_UUID: &str = "a0000000-0000-4000-8000-000000000001";
pub const ACL_2_UUID: &str = "a0000000-0000-4000-8000-000000000002";
pub const LSP_WEB_UUID: &str = "b0000000-0000-4000-8000-000000000001";
pub const LSP_ROUTER_UUID: &str = "b0000000-0000-4000-8000-000000000002";
pub const LSP_DYN_UUID: &str = "b0000000-0000-4000-8000-000000000003";

const COMMANDS: &str = "The available commands are:\n  coverage/show\n  exit\n  list-commands\n  ovsdb-server/list-dbs\n  vlog/set            {spec | PATTERN:destination:pattern}\n";

const COVERAGE: &str = "Event coverage, avg rate over last: 5 seconds, last minute, last hour,  hash=2ea2f3bb:\n\
hmap_pathological          0.0/sec     0.000/sec        0.0006/sec   total: 3\n\
txn_success                0.2/sec     0.017/sec        0.0044/sec   total: 16\n\
poll_create_node          24.6/sec    18.050/sec       17.1014/sec   total: 61832\n\
62 events never hit\n";

#[derive(Default)]
struct State {
    /// Every message received, in arrival order.
    received: Mutex<Vec<Value>>,
    empty_appctl: bool,
}

pub struct MockOvsdbServer {
    _dir: TempDir,
    path: PathBuf,
    state: Arc<State>,
    task: JoinHandle<()>,
}

impl MockOvsdbServer {
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    /// A server whose appctl commands answer with empty text.
    pub async fn start_with_empty_appctl() -> Self {
        Self::start_with(true).await
    }

    async fn start_with(empty_appctl: bool) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db.sock");
        let listener = UnixListener::bind(&path).expect("bind mock socket");
        let state = Arc::new(State {
            received: Mutex::new(Vec::new()),
            empty_appctl,
        });

        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&accept_state)));
            }
        });

        Self {
            _dir: dir,
            path,
            state,
            task,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("unix:{}", self.path.display())
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().unwrap().clone()
    }

    /// Received requests for `method`, in order.
    pub fn requests_for(&self, method: &str) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter(|m| m.get("method").and_then(Value::as_str) == Some(method))
            .collect()
    }
}

impl Drop for MockOvsdbServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut stream: UnixStream, state: Arc<State>) {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut pending_keepalive: Option<Value> = None;

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let mut messages = Vec::new();
        let mut consumed = 0;
        {
            let mut values = serde_json::Deserializer::from_slice(&buf).into_iter::<Value>();
            while let Some(Ok(value)) = values.next() {
                messages.push(value);
                consumed = values.byte_offset();
            }
        }
        buf.drain(..consumed);

        for message in messages {
            state.received.lock().unwrap().push(message.clone());
            for reply in handle(&state, message, &mut pending_keepalive) {
                let bytes = serde_json::to_vec(&reply).unwrap();
                if stream.write_all(&bytes).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn ok(id: Value, result: Value) -> Value {
    json!({"result": result, "error": null, "id": id})
}

fn err(id: Value, error: Value) -> Value {
    json!({"result": null, "error": error, "id": id})
}

fn handle(state: &State, message: Value, pending_keepalive: &mut Option<Value>) -> Vec<Value> {
    let id = message["id"].clone();
    let method = match message.get("method").and_then(Value::as_str) {
        Some(method) => method.to_string(),
        None => {
            // Client's reply to our keepalive: answer the request that triggered it
            // with whatever the client echoed back.
            return match pending_keepalive.take() {
                Some(pending_id) => vec![ok(pending_id, message["result"].clone())],
                None => Vec::new(),
            };
        }
    };
    let params = message.get("params").cloned().unwrap_or_else(|| json!([]));

    match method.as_str() {
        "list_dbs" => vec![ok(id, json!([DATABASE, NB_DATABASE, "_Server"]))],
        "get_schema" => match params[0].as_str() {
            Some(DATABASE) => vec![ok(id, schema())],
            Some(NB_DATABASE) => vec![ok(id, nb_schema())],
            Some("Broken") => vec![ok(id, json!({"name": "Broken"}))],
            other => vec![err(
                id,
                json!({
                    "error": "unknown database",
                    "details": format!("get_schema request specifies unknown database {}", other.unwrap_or_default())
                }),
            )],
        },
        "echo" => match params[0].as_str() {
            Some("mangle") => vec![ok(id, json!(["mangled"]))],
            _ => vec![ok(id, params)],
        },
        "transact" => match params[0].as_str() {
            Some(DATABASE) => vec![ok(id, transact(&params[1], table_rows))],
            Some(NB_DATABASE) => vec![ok(id, transact(&params[1], nb_table_rows))],
            _ => vec![err(id, json!({"error": "unknown database"}))],
        },
        "list-commands" if state.empty_appctl => vec![ok(id, json!(""))],
        "list-commands" => vec![ok(id, json!(COMMANDS))],
        "coverage/show" if state.empty_appctl => vec![ok(id, json!(""))],
        "coverage/show" => vec![ok(id, json!(COVERAGE))],
        "never_answers" => Vec::new(),
        "keepalive_first" => {
            *pending_keepalive = Some(id);
            vec![
                json!({"method": "update", "params": [null, {}], "id": null}),
                json!({"method": "echo", "params": ["ka"], "id": "echo"}),
            ]
        }
        "wrong_id" => vec![ok(json!(999_999), json!("stale"))],
        _ => vec![err(id, json!({"error": "unknown method"}))],
    }
}

fn transact(op: &Value, rows_of: fn(&str) -> Option<Vec<Value>>) -> Value {
    let table = op["table"].as_str().unwrap_or_default();
    let Some(rows) = rows_of(table) else {
        return json!([{"error": "syntax error", "details": format!("no table named {}", table)}]);
    };
    if table == "Lossy" {
        return json!([{ "rows": rows }]);
    }

    let conditions = op["where"].as_array().cloned().unwrap_or_default();
    let columns: Option<Vec<String>> = op
        .get("columns")
        .and_then(|c| serde_json::from_value(c.clone()).ok());

    let selected: Vec<Value> = rows
        .into_iter()
        .filter(|row| {
            conditions
                .iter()
                .all(|c| row.get(c[0].as_str().unwrap_or_default()) == Some(&c[2]))
        })
        .map(|row| match &columns {
            Some(columns) => {
                let projected: serde_json::Map<String, Value> = columns
                    .iter()
                    .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                    .collect();
                Value::Object(projected)
            }
            None => row,
        })
        .collect();

    json!([{ "rows": selected }])
}

fn table_rows(table: &str) -> Option<Vec<Value>> {
    let rows = match table {
        "Open_vSwitch" => vec![json!({
            "_uuid": ["uuid", OVS_UUID],
            "db_version": "8.3.0",
            "ovs_version": "3.1.0",
            "next_cfg": 7,
            "bridges": ["set", [["uuid", BR_INT_UUID], ["uuid", BR_EX_UUID]]],
            "external_ids": ["map", [["hostname", "node1"], ["system-id", "abc"]]]
        })],
        "Bridge" => vec![
            json!({
                "_uuid": ["uuid", BR_INT_UUID],
                "name": "br-int",
                "ports": ["set", [["uuid", PORT_1_UUID], ["uuid", PORT_2_UUID]]],
                "external_ids": ["map", [["owner", "ovn"]]],
                "stp_enable": false,
                "datapath_id": "0000aabbccdd"
            }),
            json!({
                "_uuid": ["uuid", BR_EX_UUID],
                "name": "br-ex",
                "ports": ["uuid", PORT_3_UUID],
                "external_ids": ["map", []],
                "stp_enable": true,
                "datapath_id": ["set", []]
            }),
        ],
        "Interface" => vec![
            json!({
                "name": "eth0",
                "mtu": 1500,
                "link_speed": 10000000000.0,
                "statistics": ["map", [["rx_bytes", 100], ["tx_bytes", 42]]]
            }),
            json!({
                "name": "eth1",
                "mtu": 9000,
                "link_speed": 1000000000.0,
                "statistics": ["map", []]
            }),
        ],
        "Lossy" => vec![json!({"name": "x"})],
        _ => return None,
    };
    Some(rows)
}

pub fn schema() -> Value {
    json!({
        "name": DATABASE,
        "version": "8.3.0",
        "tables": {
            "Open_vSwitch": {
                "columns": {
                    "db_version": {"type": {"key": "string", "min": 0, "max": 1}},
                    "ovs_version": {"type": {"key": "string", "min": 0, "max": 1}},
                    "next_cfg": {"type": "integer"},
                    "bridges": {"type": {"key": {"type": "uuid", "refTable": "Bridge"},
                                         "min": 0, "max": "unlimited"}},
                    "external_ids": {"type": {"key": "string", "value": "string",
                                              "min": 0, "max": "unlimited"}}
                },
                "isRoot": true,
                "maxRows": 1
            },
            "Bridge": {
                "columns": {
                    "name": {"type": "string", "mutable": false},
                    "ports": {"type": {"key": {"type": "uuid", "refTable": "Port"},
                                       "min": 0, "max": "unlimited"}},
                    "external_ids": {"type": {"key": "string", "value": "string",
                                              "min": 0, "max": "unlimited"}},
                    "stp_enable": {"type": "boolean"},
                    "datapath_id": {"type": {"key": "string", "min": 0, "max": 1}}
                },
                "indexes": [["name"]]
            },
            "Interface": {
                "columns": {
                    "name": {"type": "string"},
                    "mtu": {"type": "integer"},
                    "link_speed": {"type": "real"},
                    "statistics": {"type": {"key": "string", "value": "integer",
                                            "min": 0, "max": "unlimited"}}
                }
            }
        }
    })
}

fn nb_table_rows(table: &str) -> Option<Vec<Value>> {
    let rows = match table {
        "ACL" => vec![
            json!({
                "_uuid": ["uuid", ACL_1_UUID],
                "action": "allow-related",
                "direction": "from-lport",
                "match": "inport == \"web-1\" && ip4",
                "priority": 1002,
                "external_ids": ["map", [["neutron:security_group_rule_id", "sg-rule-1"]]],
                "log": false
            }),
            json!({
                "_uuid": ["uuid", ACL_2_UUID],
                "action": "drop",
                "direction": "to-lport",
                "match": "outport == \"web-1\"",
                "priority": 1001,
                "external_ids": ["map", []],
                "log": true
            }),
        ],
        "Logical_Switch_Port" => vec![
            json!({
                "_uuid": ["uuid", LSP_WEB_UUID],
                "name": "web-1",
                "addresses": "0a:00:00:00:00:01 10.0.0.11 fd00::11",
                "external_ids": ["map", [["neutron:device_owner", "compute:nova"]]],
                "up": true
            }),
            json!({
                "_uuid": ["uuid", LSP_ROUTER_UUID],
                "name": "rtr-port",
                "addresses": "router",
                "external_ids": ["map", []],
                "up": ["set", []]
            }),
            json!({
                "_uuid": ["uuid", LSP_DYN_UUID],
                "name": "dyn-1",
                "addresses": ["set", ["0a:00:00:00:00:03 dynamic", "unknown"]],
                "external_ids": ["map", []],
                "up": false
            }),
        ],
        _ => return None,
    };
    Some(rows)
}

pub fn nb_schema() -> Value {
    json!({
        "name": NB_DATABASE,
        "version": "7.3.0",
        "tables": {
            "ACL": {
                "columns": {
                    "action": {"type": {"key": {"type": "string",
                        "enum": ["set", ["allow", "allow-related", "drop", "reject"]]}}},
                    "direction": {"type": {"key": {"type": "string",
                        "enum": ["set", ["from-lport", "to-lport"]]}}},
                    "match": {"type": "string"},
                    "priority": {"type": {"key": {"type": "integer",
                        "minInteger": 0, "maxInteger": 32767}}},
                    "log": {"type": "boolean"},
                    "external_ids": {"type": {"key": "string", "value": "string",
                                              "min": 0, "max": "unlimited"}}
                },
                "isRoot": false
            },
            "Logical_Switch_Port": {
                "columns": {
                    "name": {"type": "string"},
                    "addresses": {"type": {"key": "string", "min": 0, "max": "unlimited"}},
                    "up": {"type": {"key": "boolean", "min": 0, "max": 1}},
                    "external_ids": {"type": {"key": "string", "value": "string",
                                              "min": 0, "max": "unlimited"}}
                },
                "indexes": [["name"]]
            }
        }
    })
}
