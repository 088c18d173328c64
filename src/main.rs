use blocktext::block::Point;
use blocktext::config::{self, load_or_default};
use blocktext::fltk_overlay::create_field_widget;
use blocktext::{Block, FieldTextArea, SourceBlock, Workspace};
use clap::Parser;
use fltk::{prelude::*, *};
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(name = "blocktext-gui")]
#[command(about = "Edit a multi-line block field in place", long_about = None)]
struct Args {
    /// Initial field text
    #[arg(value_name = "TEXT", default_value = "Hello\nblocks")]
    text: String,

    /// Lay the block out right-to-left
    #[arg(long)]
    rtl: bool,

    /// Workspace zoom
    #[arg(short, long, default_value_t = 1.0)]
    scale: f64,

    /// Config file (default: the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if !(args.scale > 0.0) {
        eprintln!("Error: scale must be positive, got {}", args.scale);
        std::process::exit(1);
    }

    let config_path = args.config.clone().or_else(config::config_file_path);
    let field_config = load_or_default(config_path.as_deref());

    let app = app::App::default();
    let mut wind = window::Window::default()
        .with_size(480, 320)
        .with_label("blocktext");

    let workspace = Rc::new(Workspace::new(field_config));
    workspace.set_scale(args.scale);
    let block = Block::new("block-1", workspace.clone(), args.rtl);
    block.move_to(Point::new(40.0, 40.0));
    let field = FieldTextArea::new("TEXT", &args.text, None);
    field.set_on_finish_editing(|text| log::info!("committed {:?}", text));
    block.append_field(field.clone());
    block.render();

    wind.begin();
    let (frame, _overlay) = create_field_widget(0, 0, 480, 320, field, workspace.clone());
    wind.end();
    wind.make_resizable(true);
    wind.show();

    workspace.set_layout_hook({
        let frame = frame.clone();
        move || {
            let mut frame = frame.clone();
            frame.redraw();
        }
    });

    workspace.events().subscribe(|change| {
        log::info!(
            "{} {}: {:?} -> {:?}",
            change.block_id,
            change.name,
            change.old_value,
            change.new_value
        );
    });

    if let Err(e) = app.run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
