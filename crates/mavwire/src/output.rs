use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mavwire_frame::{Message, Value};
use mavwire_schema::Schema;
use serde::Serialize;
use serde_json::{json, Map};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    message_id: u8,
    name: &'a str,
    sequence: u8,
    system_id: u8,
    component_id: u8,
    crc: Option<u16>,
    fields: Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct DefinitionOutput<'a> {
    id: u8,
    name: &'a str,
    payload_len: usize,
    extra_crc: u8,
    fields: Vec<FieldOutput<'a>>,
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_name: String,
    offset: usize,
}

/// Collects decoded messages into one table, printed when done.
pub struct MessageTable {
    table: Table,
}

impl MessageTable {
    pub fn new() -> Self {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["ID", "NAME", "SEQ", "SYS", "COMP", "FIELDS"]);
        Self { table }
    }

    pub fn push(&mut self, message: &Message) {
        self.table.add_row(vec![
            message.message_id().to_string(),
            message.name().to_string(),
            message.sequence().to_string(),
            message.system_id().to_string(),
            message.component_id().to_string(),
            field_summary(message),
        ]);
    }

    pub fn print(self) {
        println!("{}", self.table);
    }
}

impl Default for MessageTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Print one message in a streaming format (everything except `Table`).
pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Table => {
            let out = MessageOutput {
                message_id: message.message_id(),
                name: message.name(),
                sequence: message.sequence(),
                system_id: message.system_id(),
                component_id: message.component_id(),
                crc: message.received_crc(),
                fields: message
                    .values()
                    .map(|(field, value)| (field.name().to_string(), value_to_json(&value)))
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => println!("{message}"),
        OutputFormat::Raw => print_raw(message.payload()),
    }
}

pub fn print_definitions(schema: &Schema, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<DefinitionOutput<'_>> = schema
                .definitions()
                .map(|def| DefinitionOutput {
                    id: def.id(),
                    name: def.name(),
                    payload_len: def.payload_len(),
                    extra_crc: def.extra_crc(),
                    fields: def
                        .fields()
                        .iter()
                        .map(|field| FieldOutput {
                            name: field.name(),
                            type_name: type_name(field),
                            offset: field.offset(),
                        })
                        .collect(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "LENGTH", "EXTRA CRC", "FIELDS"]);
            for def in schema.definitions() {
                table.add_row(vec![
                    def.id().to_string(),
                    def.name().to_string(),
                    def.payload_len().to_string(),
                    def.extra_crc().to_string(),
                    def.fields().len().to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for def in schema.definitions() {
                println!(
                    "{} {} (length={} extra_crc={})",
                    def.id(),
                    def.name(),
                    def.payload_len(),
                    def.extra_crc()
                );
                for field in def.fields() {
                    println!("    {:>3}  {} {}", field.offset(), type_name(field), field.name());
                }
            }
        }
        OutputFormat::Raw => {
            for def in schema.definitions() {
                println!("{} {}", def.id(), def.name());
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(v) => json!(v),
        Value::UInt(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Double(v) => json!(v),
        Value::Char(c) => json!(char::from(*c).to_string()),
        Value::Bytes(_) => json!(value.to_text().unwrap_or_default()),
        Value::Array(items) => items.iter().map(value_to_json).collect(),
    }
}

fn field_summary(message: &Message) -> String {
    message
        .values()
        .map(|(field, value)| format!("{}={}", field.name(), value_to_json(&value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn type_name(field: &mavwire_schema::Field) -> String {
    if field.is_array() {
        format!("{}[{}]", field.data_type(), field.array_len())
    } else {
        field.data_type().to_string()
    }
}
