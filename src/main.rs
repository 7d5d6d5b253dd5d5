//! # dungeon_ed command line
//!
//! Generates rooms and dungeons and checks saved levels without opening an
//! editor window.
//!
//! ```text
//! dungeon_ed [--config <file>] generate <seed> <width> <height> <out.json>
//! dungeon_ed [--config <file>] dungeon <seed> <rooms> <out_dir>
//! dungeon_ed [--config <file>] check <file.json>
//! ```

use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use dungeon_ed::document::{self, RoomSnapshot};
use dungeon_ed::editor::RoomGenerator;
use dungeon_ed::map::RoomId;
use dungeon_ed::{EditorConfig, LevelError};

const USAGE: &str = "usage:
  dungeon_ed [--config <file>] generate <seed> <width> <height> <out.json>
  dungeon_ed [--config <file>] dungeon <seed> <rooms> <out_dir>
  dungeon_ed [--config <file>] check <file.json>";

enum Task {
    Generate {
        seed: u64,
        width: u32,
        height: u32,
        out: PathBuf,
    },
    Dungeon {
        seed: u64,
        rooms: usize,
        out_dir: PathBuf,
    },
    Check {
        file: PathBuf,
    },
}

struct Args {
    config: Option<PathBuf>,
    task: Task,
}

fn parse_args(raw: Vec<String>) -> Result<Args, Box<dyn Error>> {
    let mut config = None;
    let mut rest = Vec::new();
    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config = Some(PathBuf::from(iter.next().ok_or("--config needs a file")?));
        } else {
            rest.push(arg);
        }
    }

    let task = match rest.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["generate", seed, width, height, out] => Task::Generate {
            seed: seed.parse()?,
            width: width.parse()?,
            height: height.parse()?,
            out: PathBuf::from(*out),
        },
        ["dungeon", seed, rooms, out_dir] => Task::Dungeon {
            seed: seed.parse()?,
            rooms: rooms.parse()?,
            out_dir: PathBuf::from(*out_dir),
        },
        ["check", file] => Task::Check {
            file: PathBuf::from(*file),
        },
        _ => return Err(USAGE.into()),
    };
    Ok(Args { config, task })
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let generator = RoomGenerator::new(config.generator.clone())?;

    match args.task {
        Task::Generate {
            seed,
            width,
            height,
            out,
        } => {
            let room = generator.generate(seed, width, height)?;
            document::save(&RoomSnapshot::from_room(&room), &out)?;
            println!(
                "{}x{} room, {} passage(s) -> {}",
                width,
                height,
                room.passages.len(),
                out.display()
            );
        }
        Task::Dungeon {
            seed,
            rooms,
            out_dir,
        } => {
            let dungeon = generator.generate_dungeon(rooms, Some(seed))?;
            fs::create_dir_all(&out_dir)?;
            for room in &dungeon.rooms {
                let path = out_dir.join(format!("{}.json", room.id));
                document::save(&RoomSnapshot::from_room(room), &path)?;
            }
            if !dungeon.is_fully_connected() {
                warn!(
                    "Dungeon {} has {} disconnected groups of rooms",
                    seed,
                    dungeon.connected_components()
                );
            }
            println!(
                "{} rooms, {} links, {} dead ends -> {}",
                dungeon.rooms.len(),
                dungeon.connections.len(),
                dungeon.dead_ends(),
                out_dir.display()
            );
        }
        Task::Check { file } => {
            let snapshot = document::load(&file)?;
            let room = snapshot.to_room(RoomId::new("check"))?;
            let walls = room.grid.count("wall");
            println!(
                "{}: {}x{}, {} tile(s), {} wall(s), {} passage(s), \"{}\" v{}",
                file.display(),
                room.width(),
                room.height(),
                room.grid.occupied(),
                walls,
                room.passages.len(),
                room.metadata.name,
                room.metadata.version
            );
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    info!("dungeon_ed starting...");

    let args = parse_args(env::args().skip(1).collect())?;
    if let Err(err) = run(args) {
        if let Some(LevelError::MalformedLevel(reason)) = err.downcast_ref::<LevelError>() {
            eprintln!("level rejected: {}", reason);
        }
        return Err(err);
    }

    info!("dungeon_ed exiting.");
    Ok(())
}
