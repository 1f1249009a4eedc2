use color_eyre::eyre::{Result, WrapErr};
use netdebug::tcp::DEFAULT_PORT;
use netdebug::{AcceptStrategy, Listener, NetDebug, SharedSink, Stream, StreamConfig, TcpConfig, TcpDebugListener};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::{signal, time::interval};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct Options {
    port: u16,
    echo: bool,
    crlf: bool,
    mirror_stdout: bool,
    strategy: Option<AcceptStrategy>,
}

fn usage(program: &str) {
    eprintln!("Usage: {program} [port] [--echo] [--crlf] [--mirror-stdout] [--strategy <name>]");
    eprintln!("  port:              TCP port to listen on (default: {DEFAULT_PORT})");
    eprintln!("  --echo:            Echo client input back instead of reading commands");
    eprintln!("  --crlf:            Send a carriage return before every line feed");
    eprintln!("  --mirror-stdout:   Also write all output to stdout");
    eprintln!("  --strategy:        poll-and-replace (greets new clients) or take-if-waiting");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {program}                        # Listen on port {DEFAULT_PORT}");
    eprintln!("  {program} 4000 --crlf            # Listen on port 4000, CRLF line endings");
    eprintln!("  nc localhost {DEFAULT_PORT}                 # Attach a debug client");
}

fn parse_args(args: &[String]) -> Result<Options> {
    let program = args.first().map(String::as_str).unwrap_or("netdebug");
    let mut options = Options {
        port: DEFAULT_PORT,
        echo: false,
        crlf: false,
        mirror_stdout: false,
        strategy: None,
    };

    let mut args = args.iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--echo" => options.echo = true,
            "--crlf" => options.crlf = true,
            "--mirror-stdout" => options.mirror_stdout = true,
            "--strategy" => {
                let name = args
                    .next()
                    .ok_or_else(|| color_eyre::eyre::eyre!("--strategy needs a value"))?;
                options.strategy = Some(name.parse()?);
            }
            "-h" | "--help" => {
                usage(program);
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => {
                usage(program);
                std::process::exit(1);
            }
            port => {
                options.port = port
                    .parse()
                    .wrap_err_with(|| format!("Invalid port: {port}"))?;
            }
        }
    }

    Ok(options)
}

/// Assembles command lines from client input, bounded in length
struct LineReader {
    line: Vec<u8>,
    limit: usize,
    discarding: bool,
}

impl LineReader {
    fn new(limit: usize) -> Self {
        Self {
            line: Vec::with_capacity(limit),
            limit,
            discarding: false,
        }
    }

    /// Consumes input until a full line is read; an overlong line is dropped
    fn next_line<S: Stream>(&mut self, stream: &mut S) -> Option<String> {
        while let Some(byte) = stream.read() {
            match byte {
                b'\r' => {}
                b'\n' if self.discarding => self.discarding = false,
                b'\n' => {
                    let text = String::from_utf8_lossy(&self.line).trim().to_string();
                    self.line.clear();
                    return Some(text);
                }
                _ if self.discarding => {}
                _ if self.line.len() >= self.limit => {
                    warn!(limit = self.limit, "Discarding overlong command line");
                    self.line.clear();
                    self.discarding = true;
                }
                _ => self.line.push(byte),
            }
        }
        None
    }
}

fn run_command<L: Listener>(debug: &mut NetDebug<L>, command: &str, started: Instant) -> ControlFlow<()> {
    // Output with no client and no mirror is dropped; fmt errors cannot happen
    let _ = match command {
        "" => Ok(()),
        "help" => writeln!(
            debug,
            "commands: help, uptime, echo on, echo off, crlf on, crlf off, quit\n\
             (once echo is on, input is echoed and no longer read as commands)"
        ),
        "uptime" => writeln!(debug, "up {}s", started.elapsed().as_secs()),
        "echo on" => {
            debug.echo(true);
            writeln!(debug, "echo on")
        }
        "echo off" => {
            debug.echo(false);
            writeln!(debug, "echo off")
        }
        "crlf on" => {
            debug.cr_before_lf(true);
            writeln!(debug, "crlf on")
        }
        "crlf off" => {
            debug.cr_before_lf(false);
            writeln!(debug, "crlf off")
        }
        "quit" => {
            let _ = writeln!(debug, "bye");
            return ControlFlow::Break(());
        }
        other => writeln!(debug, "unknown command: {other}"),
    };
    ControlFlow::Continue(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Logs go to stderr so stdout can carry the mirrored debug stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("netdebug=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args)?;

    let tcp_config = TcpConfig::default().with_port(options.port);
    let mut stream_config = StreamConfig::default()
        .with_echo(options.echo)
        .with_cr_before_lf(options.crlf);
    if let Some(strategy) = options.strategy {
        stream_config = stream_config.with_strategy(strategy);
    }

    let mut debug = NetDebug::with_config(TcpDebugListener::new(tcp_config.clone()), stream_config);
    debug
        .begin()
        .wrap_err_with(|| format!("Failed to start debug listener on {}", tcp_config.bind_addr))?;

    let stdout: SharedSink = Rc::new(RefCell::new(std::io::stdout()));
    if options.mirror_stdout {
        debug.mirror(Some(&stdout));
    }

    let strategy = debug.strategy();
    info!(
        address = %tcp_config.bind_addr,
        strategy = %strategy,
        echo = options.echo,
        crlf = options.crlf,
        "Debug stream ready"
    );

    let started = Instant::now();
    let mut poll = interval(Duration::from_millis(10));
    let mut heartbeat = interval(Duration::from_secs(5));
    let mut lines = LineReader::new(tcp_config.buffer_size);

    'run: loop {
        tokio::select! {
            _ = poll.tick() => {
                if debug.available() > 0 {
                    while let Some(command) = lines.next_line(&mut debug) {
                        if run_command(&mut debug, &command, started).is_break() {
                            info!("Quit requested by debug client");
                            break 'run;
                        }
                    }
                }
            }
            _ = heartbeat.tick() => {
                let _ = writeln!(debug, "heartbeat: up {}s", started.elapsed().as_secs());
            }
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal, stopping");
                break;
            }
        }
    }

    debug.flush();
    debug.end();
    Ok(())
}
