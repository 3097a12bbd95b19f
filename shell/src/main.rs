use anyhow::Result;
use pipesh::config::{Args, ShellConfig};
use pipesh::{Interpreter, LineEditor, logging};

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    logging::init(args.log_level, args.log_file.as_deref())?;

    let config = ShellConfig::from(&args);
    if config.banner {
        println!("Type 'q' to exit");
    }

    let mut editor = LineEditor::new()?;
    Interpreter::new(config).repl(&mut editor)
}
