use std::env;
use std::process;
use til::Interp;

/// The program the interpreter was built to run.
const DEMO: &str = "\
set a 1
set b 2
set result $($a + $b)
";

fn main() {
    init_tracing();

    // FIRST, get the command line arguments.
    let args: Vec<String> = env::args().collect();

    // NEXT, create and initialize the interpreter.
    let mut interp = Interp::new();
    let scope = interp.create_scope("main", None);

    // NEXT, run the REPL, the demo, or a script file.
    match args.get(1).map(String::as_str) {
        None => til_shell::repl(&mut interp, scope),
        Some("--demo") => process::exit(demo(&mut interp, scope)),
        Some("--help") | Some("-h") => {
            println!("Usage: tilsh [--demo | filename.til [arg ...]]");
        }
        Some(_) => process::exit(til_shell::script(&mut interp, scope, &args[1..])),
    }
}

// Runs the demo program and reports its result.
fn demo(interp: &mut Interp, scope: til::ScopeId) -> i32 {
    print!("{}", DEMO);

    let status = til_shell::run_script(interp, scope, "demo", DEMO);
    if status != 0 {
        return status;
    }

    match interp.get_integer(scope, "result") {
        Ok(result) => {
            println!("=> result = {}", result);
            0
        }
        Err(exception) => {
            eprintln!("{}", exception);
            exception.status()
        }
    }
}

// Installs a log subscriber when TIL_LOG (or RUST_LOG) names a filter.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match EnvFilter::try_from_env("TIL_LOG") {
        Ok(filter) => filter,
        Err(_) if env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
        .with(filter)
        .init();

    tracing::debug!("tracing initialized");
}
