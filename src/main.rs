//! Stencil CLI
//!
//! Usage:
//!   stencil [OPTIONS] <TEMPLATE>
//!
//! Options:
//!   -c, --config <FILE>    Template set configuration (TOML format)
//!   -v, --vars <FILE>      Render variables (TOML table)
//!   -b, --base-dir <DIR>   Directory templates resolve against
//!   -i, --imports          List the macros each import directive binds
//!   -h, --help             Print help

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use stencil::config::load_variables;
use stencil::{Error, RenderContext, SetConfig, TemplateSet};

#[derive(Parser)]
#[command(name = "stencil")]
#[command(about = "Render text templates with macros imported across files")]
struct Cli {
    /// Template to render
    template: PathBuf,

    /// Template set configuration (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render variables (TOML table)
    #[arg(short, long)]
    vars: Option<PathBuf>,

    /// Directory templates resolve against (overrides the config file)
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// List the macros each import directive binds instead of rendering
    #[arg(short, long)]
    imports: bool,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match SetConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => SetConfig::default(),
    };
    if let Some(base_dir) = cli.base_dir {
        config.base_dir = base_dir;
    }

    let mut ctx = match &cli.vars {
        Some(path) => match load_variables(path) {
            Ok(vars) => RenderContext::with_variables(vars),
            Err(e) => {
                eprintln!("Error loading variables '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => RenderContext::new(),
    };

    let set = TemplateSet::new(config);
    let path = cli.template.to_string_lossy();

    let template = match set.from_file(&path) {
        Ok(template) => template,
        Err(e) => fail(Error::Compile(e)),
    };

    if cli.imports {
        for import in template.imports() {
            for (local, definition) in import.bindings() {
                println!(
                    "{}: {} = {}::{}",
                    import.position(),
                    local,
                    import.source_filename(),
                    definition.name()
                );
            }
        }
        return;
    }

    match template.render(&mut ctx) {
        Ok(out) => print!("{}", out),
        Err(e) => fail(Error::Render(e)),
    }
}

/// Report an error and exit; compile errors get a source excerpt when the
/// file they point into can be read
fn fail(err: Error) -> ! {
    match &err {
        Error::Compile(compile) => {
            let source = compile
                .position()
                .and_then(|position| fs::read_to_string(&position.filename).ok());
            match source {
                Some(source) => eprint!("{}", compile.format(&source)),
                None => eprintln!("Error: {}", err),
            }
        }
        Error::Render(_) => eprintln!("Error: {}", err),
    }
    process::exit(1);
}
