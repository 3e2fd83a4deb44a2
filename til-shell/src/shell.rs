use rustyline::{error::ReadlineError, history::MemHistory, Config, Editor};
use std::fs;
use til::{Interp, ScopeId};

/// Invokes an interactive REPL for the given interpreter and scope, using `rustyline`
/// line editing.
///
/// The REPL displays a `% ` prompt.  Input that isn't yet a complete script (an open
/// quote or `$(` group, or a trailing backslash) is continued on the next line with a
/// `> ` prompt.  Each complete script is evaluated in `scope`; non-empty results are
/// printed, and errors are printed with their error info.  Press `^C` or `^D` to leave
/// the REPL, returning control to the caller.
///
/// See [`til::interp`](../til/interp/index.html) for details on how to configure and
/// add commands to a Til interpreter.
///
/// # Example
///
/// ```no_run
/// use til::Interp;
///
/// // FIRST, create and initialize the interpreter.
/// let mut interp = Interp::new();
/// let scope = interp.create_scope("main", None);
///
/// // NOTE: commands can be added to the interpreter here.
///
/// // NEXT, invoke the REPL.
/// til_shell::repl(&mut interp, scope);
/// ```
pub fn repl(interp: &mut Interp, scope: ScopeId) {
    let mut rl = match Editor::<(), MemHistory>::with_history(Config::default(), MemHistory::new())
    {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("failed to init rustyline: {}", err);
            return;
        }
    };

    let mut buffer = String::new();
    let mut line_no = 0;

    loop {
        let prompt = if buffer.is_empty() { "% " } else { "> " };

        match rl.readline(prompt) {
            Ok(line) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if !interp.complete(&buffer) {
                    continue;
                }

                let source = std::mem::take(&mut buffer);
                if source.trim().is_empty() {
                    continue;
                }

                if let Err(e) = rl.add_history_entry(source.as_str()) {
                    eprintln!("History error: {e}");
                }

                line_no += 1;
                let program_name = format!("stdin {}", line_no);
                match interp.eval_result(scope, &program_name, &source) {
                    Ok(value) => {
                        // Don't output empty values.
                        if !value.as_str().is_empty() {
                            println!("{}", value);
                        }
                    }
                    Err(exception) => {
                        println!("{}: {}", exception.code(), exception.error_info());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("I/O Error: {:?}", err);
                break;
            }
        }
    }
}

/// Executes a script file named by a set of command line arguments, returning the
/// status code to exit with.
///
/// `args[0]` is presumed to be the name of a Til script file.  The script is evaluated
/// in the given scope; any further arguments are bound in that scope as `arg1`,
/// `arg2`, and so on, with `argc` holding their count.  The file itself is bound as
/// `arg0`.
///
/// Returns 0 on success, the Til status code of the first error, or 1 if the file
/// can't be read.
///
/// # Example
///
/// ```no_run
/// use til::Interp;
/// use std::env;
///
/// // FIRST, get the command line arguments.
/// let args: Vec<String> = env::args().collect();
///
/// // NEXT, create and initialize the interpreter.
/// let mut interp = Interp::new();
/// let scope = interp.create_scope("main", None);
///
/// // NEXT, evaluate the file, if any.
/// if args.len() > 1 {
///     std::process::exit(til_shell::script(&mut interp, scope, &args[1..]));
/// } else {
///     eprintln!("Usage: myshell filename.til");
/// }
/// ```
pub fn script(interp: &mut Interp, scope: ScopeId, args: &[String]) -> i32 {
    let Some(arg0) = args.first() else {
        eprintln!("no script file given");
        return 1;
    };

    match fs::read_to_string(arg0) {
        Ok(source) => {
            interp.set_var(scope, "arg0", arg0.as_str().into());
            interp.set_var(scope, "argc", (args.len() as i64 - 1).into());
            for (i, arg) in args.iter().enumerate().skip(1) {
                interp.set_var(scope, &format!("arg{}", i), arg.as_str().into());
            }

            run_script(interp, scope, arg0, &source)
        }
        Err(e) => {
            eprintln!("{}: {}", arg0, e);
            1
        }
    }
}

/// Evaluates script text in the given scope, printing the error info of a failure to
/// stderr.  Returns the evaluation's status code.
pub fn run_script(interp: &mut Interp, scope: ScopeId, program_name: &str, source: &str) -> i32 {
    match interp.eval_result(scope, program_name, source) {
        Ok(_) => 0,
        Err(exception) => {
            tracing::debug!(program_name, code = %exception.code(), "script failed");
            eprintln!("{}: {}", exception.code(), exception.error_info());
            exception.status()
        }
    }
}
