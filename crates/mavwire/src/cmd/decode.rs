use std::fs::File;
use std::io::{self, Read};
use std::sync::Arc;

use mavwire_frame::MessageStream;

use crate::cmd::schema::load_dialect;
use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_message, MessageTable, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = Arc::new(load_dialect(&args.dialect)?);

    let source: Box<dyn Read> = if args.input.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input).map_err(|err| {
            io_error(&format!("failed opening {}", args.input.display()), err)
        })?;
        Box::new(file)
    };

    let mut stream = MessageStream::new(source, schema);
    let mut table = matches!(format, OutputFormat::Table).then(MessageTable::new);
    let mut printed = 0usize;

    while args.count.is_none_or(|limit| printed < limit) {
        let Some(message) = stream
            .read()
            .map_err(|err| frame_error("decode failed", err))?
        else {
            break;
        };

        if args.id.is_some_and(|id| id != message.message_id()) {
            continue;
        }

        match table.as_mut() {
            Some(table) => table.push(&message),
            None => print_message(&message, format),
        }
        printed += 1;
    }

    if let Some(table) = table {
        table.print();
    }

    let stats = stream.stats();
    tracing::info!(
        messages = stats.messages_read,
        printed,
        bytes_skipped = stats.bytes_skipped,
        bad_start_signs = stats.bad_start_signs,
        unknown_ids = stats.unknown_ids,
        length_mismatches = stats.length_mismatches,
        checksum_errors = stats.checksum_errors,
        leftover = stream.buffered(),
        "decode finished"
    );

    Ok(SUCCESS)
}
