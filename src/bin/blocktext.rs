use blocktext::config::{self, FieldConfig, load_config};
use blocktext::events::FieldChange;
use blocktext::overlay::{Key, KeyEvent};
use blocktext::{Block, Field, FieldTextArea, Validation, Validator, Workspace};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(name = "blocktext")]
#[command(about = "Render and edit multi-line block fields headlessly", long_about = None)]
struct Args {
    /// Config file (default: the user config directory)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SVG markup and size of a field
    Render {
        /// Field text; a literal `\n` starts a new line
        text: String,

        /// Lay the block out right-to-left
        #[arg(long)]
        rtl: bool,

        /// Workspace zoom
        #[arg(short, long, default_value_t = 1.0)]
        scale: f64,
    },
    /// Run an edit session and print the result
    Edit {
        /// Text the field starts with
        initial: String,

        /// Overlay content after each keystroke
        #[arg(short = 't', long = "type", value_name = "VALUE")]
        typed: Vec<String>,

        /// Cancel with Escape instead of committing
        #[arg(long)]
        escape: bool,

        /// Reject values containing this text
        #[arg(long, value_name = "PATTERN")]
        reject: Option<String>,

        /// Lay the block out right-to-left
        #[arg(long)]
        rtl: bool,
    },
    /// Show the config path and the effective settings
    Config,
}

fn unescape(arg: &str) -> String {
    arg.replace("\\n", "\n")
}

fn load(path: Option<&Path>) -> Result<FieldConfig, String> {
    match path {
        Some(path) => load_config(path).map_err(|e| e.to_string()),
        None => Ok(config::load_or_default(config::config_file_path().as_deref())),
    }
}

/// A workspace holding one block with a single field. The block must outlive
/// the field's use, since fields only keep a weak link to it.
fn host(
    config: FieldConfig,
    text: &str,
    rtl: bool,
    validator: Option<Validator>,
) -> (Rc<Workspace>, Rc<Block>, Rc<FieldTextArea>) {
    let workspace = Rc::new(Workspace::new(config));
    let block = Block::new("block-1", workspace.clone(), rtl);
    let field = FieldTextArea::new("TEXT", text, validator);
    block.append_field(field.clone());
    (workspace, block, field)
}

fn cmd_render(config: FieldConfig, text: &str, rtl: bool, scale: f64) -> Result<(), String> {
    if !(scale > 0.0) {
        return Err(format!("scale must be positive, got {}", scale));
    }
    let (workspace, _block, field) = host(config, text, rtl, None);
    workspace.set_scale(scale);

    let size = field.size();
    println!("{}", field.svg_markup());
    println!(
        "size: {}x{} ({}x{} at scale {})",
        size.width,
        size.height,
        size.width * scale,
        size.height * scale,
        scale
    );
    Ok(())
}

fn cmd_edit(
    config: FieldConfig,
    initial: &str,
    typed: &[String],
    escape: bool,
    reject: Option<String>,
    rtl: bool,
) -> Result<(), String> {
    let validator: Option<Validator> = reject.map(|pattern| {
        Rc::new(move |value: &str| {
            if value.contains(&pattern) {
                Validation::Reject
            } else {
                Validation::Accept
            }
        }) as Validator
    });
    let (workspace, _block, field) = host(config, initial, rtl, validator);

    let events: Rc<RefCell<Vec<FieldChange>>> = Rc::new(RefCell::new(Vec::new()));
    workspace.events().subscribe({
        let events = events.clone();
        move |change| events.borrow_mut().push(change.clone())
    });

    field.show_editor(false);
    let input = field
        .editor_input()
        .ok_or_else(|| "the editor did not open".to_string())?;
    for value in typed {
        input.set_value(value);
        input.dispatch(&KeyEvent::key_up(Key::Other(0)));
    }
    if escape {
        input.dispatch(&KeyEvent::key_up(Key::Escape));
    } else {
        workspace.widget_div().hide();
    }

    println!("{}", field.text());
    for change in events.borrow().iter() {
        println!(
            "change {}.{}: {:?} -> {:?}",
            change.block_id, change.name, change.old_value, change.new_value
        );
    }
    Ok(())
}

fn cmd_config(path: Option<PathBuf>) -> Result<(), String> {
    let path = path.or_else(config::config_file_path);
    match &path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config directory"),
    }
    let config = load(path.as_deref())?;
    print!("{}", config.to_toml().map_err(|e| e.to_string())?);
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let result = match args.command {
        Commands::Config => cmd_config(args.config),
        Commands::Render { text, rtl, scale } => {
            load(args.config.as_deref()).and_then(|c| cmd_render(c, &unescape(&text), rtl, scale))
        }
        Commands::Edit {
            initial,
            typed,
            escape,
            reject,
            rtl,
        } => {
            let typed: Vec<String> = typed.iter().map(|t| unescape(t)).collect();
            load(args.config.as_deref())
                .and_then(|c| cmd_edit(c, &unescape(&initial), &typed, escape, reject, rtl))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
