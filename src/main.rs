mod catalog;
mod clipboard;
mod config;
mod error;
mod filter;
mod model;
mod state;
mod ui;

use anyhow::Result;
use calloop::EventLoop;
use calloop_wayland_source::WaylandSource;
use smithay_client_toolkit::{
    shell::wlr_layer::{Layer, KeyboardInteractivity, Anchor},
    shell::WaylandSurface,
};
use wayland_client::{Connection, globals::registry_queue_init};
use crate::catalog::{LoadedCatalog, load_catalog};
use crate::clipboard::CopyOutcome;
use crate::config::{Config, load_config};
use crate::model::Catalog;
use crate::state::Session;
use crate::ui::wayland::WaylandApp;
use crate::ui::render::Renderer;
use crate::ui::icons::IconCache;
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse and search a registry of MCP servers", long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog file to load, overriding the config
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Initial search query
    #[arg(short, long, default_value = "")]
    query: String,

    /// Print the matching servers and exit instead of opening a window
    #[arg(long)]
    print: bool,

    /// With --print, emit JSON
    #[arg(long, requires = "print")]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load Config
    let mut config = load_config(args.config.as_deref())?;
    if let Some(path) = &args.catalog {
        config.catalog.path = Some(path.clone());
    }

    if args.print {
        let loaded = load_catalog(&config.catalog);
        let mut out = std::io::stdout().lock();
        return print_view(&mut out, loaded, &args.query, args.json);
    }

    run_window(config, &args.query)
}

/// Headless mode: writes the filtered view to `out`.
fn print_view(out: &mut impl Write, loaded: LoadedCatalog, query: &str, json: bool) -> Result<()> {
    if let Some(notice) = &loaded.notice {
        eprintln!("{}", notice);
    }

    let view = filter::filter(loaded.catalog.get_all(), query);

    if json {
        serde_json::to_writer_pretty(&mut *out, &view)?;
        writeln!(out)?;
        return Ok(());
    }

    for entry in &view {
        writeln!(out, "{}", entry.name)?;
        if !entry.description.is_empty() {
            writeln!(out, "  {}", entry.description)?;
        }
        writeln!(out, "  $ {}", entry.command)?;
    }
    Ok(())
}

fn run_window(config: Config, query: &str) -> Result<()> {
    // 2. Setup Wayland Connection & Event Loop
    let mut event_loop: EventLoop<WaylandApp> = EventLoop::try_new()?;
    let conn = Connection::connect_to_env()?;
    let (globals, event_queue) = registry_queue_init::<WaylandApp>(&conn)?;
    let qh = event_queue.handle();

    // 3. Init State & UI
    let (tx_icons, rx_icons) = calloop::channel::channel::<(String, Option<tiny_skia::Pixmap>)>();
    let icon_cache = IconCache::new(tx_icons, config.theme.icon_dirs.clone());
    let renderer = Renderer::new(icon_cache);

    let mut session = Session::new(Catalog::default());
    session.set_query(query);
    let (tx_copy, rx_copy) = calloop::channel::channel::<CopyOutcome>();
    let mut app = WaylandApp::new(&globals, &qh, config.clone(), session, renderer, tx_copy)?;

    // 4. Create Layer Surface
    let surface = app.compositor_state.create_surface(&qh);
    let layer_surface = app.layer_shell_state.create_layer_surface(
        &qh,
        surface,
        Layer::Overlay,
        Some("mcp-registry"),
        None,
    );

    layer_surface.set_anchor(Anchor::empty());
    layer_surface.set_size(config.theme.width, config.theme.height);
    layer_surface.set_keyboard_interactivity(KeyboardInteractivity::Exclusive);
    layer_surface.commit();
    app.layer_surface = Some(layer_surface);

    // 5. Load the catalog off the event loop
    let (tx_catalog, rx_catalog) = calloop::channel::channel::<LoadedCatalog>();
    let catalog_config = config.catalog.clone();
    thread::spawn(move || {
        let _ = tx_catalog.send(load_catalog(&catalog_config));
    });

    let conn_icons = conn.clone();
    let qh_icons = qh.clone();
    event_loop
        .handle()
        .insert_source(rx_icons, move |event, _, app: &mut WaylandApp| {
            if let calloop::channel::Event::Msg((name, pixmap)) = event {
                app.renderer.insert_icon(name, pixmap);
                app.draw(&conn_icons, &qh_icons);
            }
        })
        .map_err(|e| anyhow::anyhow!("inserting icon source: {}", e.error))?;

    let conn_catalog = conn.clone();
    let qh_catalog = qh.clone();
    event_loop
        .handle()
        .insert_source(rx_catalog, move |event, _, app: &mut WaylandApp| {
            if let calloop::channel::Event::Msg(loaded) = event {
                app.session.catalog_notice = loaded.notice;
                app.session.set_catalog(loaded.catalog);
                app.draw(&conn_catalog, &qh_catalog);
            }
        })
        .map_err(|e| anyhow::anyhow!("inserting catalog source: {}", e.error))?;

    let conn_copy = conn.clone();
    let qh_copy = qh.clone();
    event_loop
        .handle()
        .insert_source(rx_copy, move |event, _, app: &mut WaylandApp| {
            if let calloop::channel::Event::Msg(outcome) = event {
                app.finish_copy(outcome);
                app.draw(&conn_copy, &qh_copy);
            }
        })
        .map_err(|e| anyhow::anyhow!("inserting clipboard source: {}", e.error))?;

    event_loop
        .handle()
        .insert_source(WaylandSource::new(conn.clone(), event_queue), |_, queue, app| {
            queue.dispatch_pending(app)
        })
        .map_err(|e| anyhow::anyhow!("inserting wayland source: {}", e.error))?;

    // 6. Run Loop
    while !app.should_exit {
        event_loop.dispatch(None, &mut app)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{load_from, seed::SeedSource};

    fn printed(query: &str, json: bool) -> String {
        let mut out = Vec::new();
        print_view(&mut out, load_from(&SeedSource, None), query, json).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["mcp-registry", "--print", "-q", "api", "--json"]).unwrap();
        assert!(args.print);
        assert!(args.json);
        assert_eq!(args.query, "api");
        assert!(args.catalog.is_none());
    }

    #[test]
    fn test_json_requires_print() {
        assert!(Args::try_parse_from(["mcp-registry", "--json"]).is_err());
    }

    #[test]
    fn test_print_text() {
        let text = printed("backup", false);
        assert_eq!(
            text,
            "Backup Server\n  Automated backup and recovery system\n  $ mcp start backup --interval 6h\n"
        );
    }

    #[test]
    fn test_print_json() {
        let json = printed("cluster", true);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let list = value.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["name"], "Cluster Node");
        assert_eq!(list[0]["command"], "mcp start node --cluster main --role worker");
        assert!(list[0].get("icon").is_none());
    }

    #[test]
    fn test_print_unavailable_catalog_is_empty() {
        let loaded = LoadedCatalog {
            catalog: Catalog::default(),
            notice: Some("Catalog unavailable: test".to_string()),
        };
        let mut out = Vec::new();
        print_view(&mut out, loaded, "", true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]");
    }
}
