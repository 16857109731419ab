// main.rs

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self};
use std::sync::Arc;

use taskdeck::app::App;
use taskdeck::config::{self, Config};
use taskdeck::logging;
use taskdeck::remote::HttpItemStore;
use taskdeck::store::{ItemStore, MemoryStore};

const USAGE: &str = "Usage: taskdeck [--server URL] [--demo]

  --server URL   item service base URL (overrides config and TASKDECK_SERVER_URL)
  --demo         use an in-memory item list instead of a server";

struct Args {
    server: Option<String>,
    demo: bool,
}

fn parse_args() -> Result<Option<Args>, String> {
    let mut args = Args {
        server: None,
        demo: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--server" => {
                let url = it.next().ok_or("--server needs a URL")?;
                args.server = Some(url);
            }
            "--demo" => args.demo = true,
            "-h" | "--help" => return Ok(None),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(Some(args))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args() {
        Ok(Some(a)) => a,
        Ok(None) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let log_path = logging::init(&config::data_dir())?;

    let mut cfg = match Config::load_from_file(config::config_path()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring config file");
            Config::default()
        }
    };
    cfg = match cfg.clone().with_env(|k| std::env::var(k).ok()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring environment overrides");
            cfg
        }
    };
    if let Some(url) = args.server {
        cfg.server_url = url;
    }

    let store: Arc<dyn ItemStore> = if args.demo {
        tracing::info!("running against the in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let remote = HttpItemStore::new(&cfg.server_url, cfg.request_timeout())?;
        tracing::info!(server = %remote.base_url(), "using item service");
        Arc::new(remote)
    };
    let mut app = App::new(store, cfg.rows_per_page);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Blocks until the user quits
    let res = taskdeck::tui::run_app(&mut terminal, &mut app);

    // Restore terminal state
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Let outstanding requests land so nothing is cut off mid-write on the server
    app.settle();
    tracing::info!("exiting");

    if let Err(err) = res {
        eprintln!("Application error: {}", err);
        eprintln!("See {} for details", log_path.display());
    }

    Ok(())
}
