use mavwire_schema::Schema;

use crate::cmd::SchemaArgs;
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_definitions, OutputFormat};

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_dialect(&args.dialect)?;
    print_definitions(&schema, format);
    Ok(SUCCESS)
}

pub(crate) fn load_dialect(path: &std::path::Path) -> CliResult<Schema> {
    let schema = Schema::from_file(path)
        .map_err(|err| schema_error(&format!("failed loading {}", path.display()), err))?;
    tracing::debug!(path = %path.display(), messages = schema.len(), "dialect loaded");
    Ok(schema)
}
