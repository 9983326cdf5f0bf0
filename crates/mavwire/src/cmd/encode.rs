use mavwire_frame::{Message, Value};

use crate::cmd::schema::load_dialect;
use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_raw, to_hex, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_dialect(&args.dialect)?;
    let mut message = Message::by_name(&schema, &args.message, args.system_id, args.component_id)
        .map_err(|err| frame_error("cannot build message", err))?;

    let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&args.fields)
        .map_err(|err| CliError::new(USAGE, format!("--fields must be a JSON object: {err}")))?;

    for (name, json) in &fields {
        let scalar = !message
            .field(name)
            .map_err(|err| frame_error("cannot set field", err))?
            .is_array();
        let value = json_to_value(json, scalar)
            .ok_or_else(|| CliError::new(USAGE, format!("unsupported value for {name}: {json}")))?;
        message
            .set(name, value)
            .map_err(|err| frame_error("cannot set field", err))?;
    }

    let frame = message.encode(args.sequence);
    tracing::debug!(
        message = message.name(),
        sequence = args.sequence,
        len = frame.len(),
        "encoded"
    );

    match format {
        OutputFormat::Raw => print_raw(&frame),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "message_id": message.message_id(),
                "name": message.name(),
                "sequence": args.sequence,
                "frame": to_hex(&frame),
            })
        ),
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", to_hex(&frame)),
    }

    Ok(SUCCESS)
}

/// Map a JSON field value onto the closest [`Value`]; the message setter
/// does the type check against the field.
fn json_to_value(json: &serde_json::Value, scalar: bool) -> Option<Value> {
    match json {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(Value::UInt)
            .or_else(|| n.as_i64().map(Value::Int))
            .or_else(|| n.as_f64().map(Value::Double)),
        serde_json::Value::String(s) if scalar => match s.as_bytes() {
            [byte] => Some(Value::Char(*byte)),
            _ => None,
        },
        serde_json::Value::String(s) => Some(Value::Bytes(s.as_bytes().to_vec())),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| json_to_value(item, true))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        serde_json::Value::Bool(b) => Some(Value::UInt(u64::from(*b))),
        serde_json::Value::Null | serde_json::Value::Object(_) => None,
    }
}
