use clap::{crate_name, crate_version, App, Arg, ArgMatches, SubCommand};
use kcdice::config::GameConfig;
use kcdice::game::{Action, Game};
use kcdice::global::conf_def;
use kcdice::randroll::{DieWeights, FairDie, RollGen, ScriptedRolls};
use kcdice::rolliter::{die_weights_from_iter, ValueIter};
use rayon::prelude::*;
use serde_json::json;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

/// Validates the given expression can be parsed as the given type following clap's convention:
/// Return Ok(()) if yes, else Err(string_describing_the_problem)
macro_rules! validate_as {
    ($T:ty, $V:expr) => {
        match $V.parse::<$T>() {
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    };
}

/// Assuming you have previously validated the given expression can be parsed successfully as the
/// give type, this saves a tiny bit of typing and hides the unwrap
macro_rules! parse_as {
    ($T:ty, $V:expr) => {
        $V.parse::<$T>().unwrap()
    };
}

// (Copied from nightly-only rust https://doc.rust-lang.org/test/stats/trait.Stats.html)
// Helper function: extract a value representing the `pct` percentile of a sorted sample-set, using
// linear interpolation. If samples are not sorted, return nonsensical value.
fn percentile_of_sorted(sorted_samples: &[u32], pct: u8) -> u32 {
    assert!(!sorted_samples.is_empty());
    if sorted_samples.len() == 1 {
        return sorted_samples[0];
    }
    let zero: u8 = 0;
    assert!(zero <= pct);
    let hundred: u8 = 100;
    assert!(pct <= hundred);
    if pct == hundred {
        return sorted_samples[sorted_samples.len() - 1];
    }
    let length = (sorted_samples.len() - 1) as f32;
    let rank = (pct as f32 / hundred as f32) * length;
    let lrank = rank.floor();
    let d = rank - lrank;
    let n = lrank as usize;
    let lo = sorted_samples[n];
    let hi = sorted_samples[n + 1];
    (lo as f32 + ((hi - lo) as f32 * d)) as u32
}

fn get_roll_gen(args: &ArgMatches) -> Result<Box<dyn RollGen>, ()> {
    if let Some(fname) = args.value_of("dieweights") {
        let fd = match OpenOptions::new().read(true).open(fname) {
            Err(e) => {
                eprintln!("Error opening input --die-weights {}: {}", fname, e);
                return Err(());
            }
            Ok(fd) => fd,
        };
        let w: DieWeights = match serde_json::from_reader(fd) {
            Err(e) => {
                eprintln!("Error parsing DieWeights from {}: {}", fname, e);
                return Err(());
            }
            Ok(w) => w,
        };
        if !w.is_valid() {
            eprintln!("DieWeights from {} can never roll anything", fname);
            return Err(());
        }
        Ok(Box::new(w))
    } else {
        Ok(Box::new(FairDie::new()))
    }
}

fn load_config(args: &ArgMatches) -> Result<GameConfig, ()> {
    // unwrap ok: clap provides a default
    match GameConfig::load(args.value_of("config").unwrap()) {
        Err(e) => {
            eprintln!("{}", e);
            Err(())
        }
        Ok(c) => Ok(c),
    }
}

/// Play a single game with one greedy bot: keep every scorable die, bank as
/// soon as the turn score reaches bank_at. Returns how many turns it took to
/// win, or None if the game never finished.
fn bot_game(
    config: &GameConfig,
    roll_gen: Box<dyn RollGen>,
    bank_at: u32,
    max_turns: u32,
) -> Option<u32> {
    let mut game = Game::new(config, roll_gen);
    // unwrap ok: the roster is empty and the name is valid
    game.add_player("bot").unwrap();
    let mut turns = 0;
    while !game.is_game_over() && turns < max_turns {
        turns += 1;
        if game.start_turn().is_err() {
            return None;
        }
        while game.is_turn_started() && !game.is_game_over() {
            let scorable = game.scorable_dice();
            if !scorable.is_empty() && game.keep_dice(&scorable).is_err() {
                return None;
            }
            // unwrap ok: the roster is never empty
            let turn_score = game.current_player().unwrap().turn_score();
            if turn_score >= bank_at {
                if game.bank().is_err() {
                    return None;
                }
            } else if game.roll_again().is_err() {
                return None;
            }
        }
    }
    if game.is_game_over() {
        Some(turns)
    } else {
        None
    }
}

fn simulate(args: &ArgMatches) -> Result<(), ()> {
    let num_games = parse_as!(u32, args.value_of("numgames").unwrap());
    let bank_at = parse_as!(u32, args.value_of("bankat").unwrap());
    let max_turns = parse_as!(u32, args.value_of("maxturns").unwrap());
    let config = load_config(args)?;
    let mut turns: Vec<u32> = (0..num_games)
        .into_par_iter()
        .filter_map(|_| {
            let roll_gen = match get_roll_gen(args) {
                Ok(rg) => rg,
                Err(_) => return None,
            };
            bot_game(&config, roll_gen, bank_at, max_turns)
        })
        .collect();
    if turns.is_empty() {
        eprintln!("No games finished");
        return Err(());
    }
    turns.sort_unstable();
    println!(
        "{}",
        json!({
            "games": turns.len(),
            "turns_to_win": {
                "min": percentile_of_sorted(&turns, 0),
                "p25": percentile_of_sorted(&turns, 25),
                "p50": percentile_of_sorted(&turns, 50),
                "p75": percentile_of_sorted(&turns, 75),
                "p95": percentile_of_sorted(&turns, 95),
                "max": percentile_of_sorted(&turns, 100),
            },
        })
    );
    Ok(())
}

fn parse_rolls(args: &ArgMatches) -> Result<(), ()> {
    // unwrap ok: clap should have complained
    let in_fname = args.value_of("input").unwrap();
    let out_fname = args.value_of("output").unwrap();
    let in_fd = match OpenOptions::new().read(true).open(in_fname) {
        Err(e) => {
            eprintln!("Error opening input file {}: {}", in_fname, e);
            return Err(());
        }
        Ok(fd) => fd,
    };
    let out_fd = match OpenOptions::new().write(true).open(out_fname) {
        Err(e) => {
            eprintln!("Error opening output file {}: {}", out_fname, e);
            return Err(());
        }
        Ok(fd) => fd,
    };
    let w = die_weights_from_iter(ValueIter::new(in_fd));
    if w.iter().sum::<u64>() == 0 {
        eprintln!("No die faces found in {}", in_fname);
        return Err(());
    }
    let d = DieWeights::new_weights(w);
    match serde_json::to_writer(out_fd, &d) {
        Err(e) => {
            eprintln!("Error serializing or writing to file: {}", e);
            Err(())
        }
        Ok(_) => Ok(()),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  add <name>        add a player (before the first turn)");
    println!("  start             roll all dice and start the turn");
    println!("  keep <i> [i ...]  set aside the dice at these positions (0-based)");
    println!("  keep all <face>   set aside every available die showing a face");
    println!("  roll              reroll the dice not set aside");
    println!("  bank              bank the turn score and pass the turn");
    println!("  state             print the full game state as JSON");
    println!("  actions           print what is legal right now");
    println!("  new               throw this game away and start a fresh one");
    println!("  quit              leave");
}

fn show_roll(game: &Game, values: &[u8]) {
    println!("Rolled {:?}", values);
    if !game.is_turn_started() {
        println!("No scoring dice. Turn lost.");
    } else {
        println!("Scorable dice at positions {:?}", game.scorable_dice());
    }
}

fn do_keep(game: &mut Game, words: &[&str]) {
    if words.len() >= 2 && words[0] == "all" {
        let face = match words[1].parse::<u8>() {
            Err(e) => {
                eprintln!("Bad face value {}: {}", words[1], e);
                return;
            }
            Ok(f) => f,
        };
        let indices: Vec<usize> = game
            .dice_set()
            .dice()
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.kept() && d.value() == face)
            .map(|(idx, _)| idx)
            .collect();
        if indices.is_empty() {
            eprintln!("No available dice with value {}", face);
            return;
        }
        keep_and_report(game, &indices);
        return;
    }
    let mut indices = vec![];
    for word in words {
        match word.parse::<usize>() {
            Err(e) => {
                eprintln!("Bad die position {}: {}", word, e);
                return;
            }
            Ok(idx) => indices.push(idx),
        }
    }
    keep_and_report(game, &indices);
}

fn keep_and_report(game: &mut Game, indices: &[usize]) {
    match game.keep_dice(indices) {
        Err(e) => eprintln!("{}", e),
        Ok(score) => {
            // unwrap ok: keeping dice requires a turn, thus a player
            let p = game.current_player().unwrap();
            println!(
                "Kept for {} points. Turn score {}.",
                score,
                p.turn_score()
            );
            println!("{}", game.dice_set());
        }
    }
}

fn repl(game: &mut Game, config: &GameConfig) {
    let stdin = io::stdin();
    print_help();
    print!("> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let line = match line {
            Err(_) => break,
            Ok(l) => l,
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first() {
            None => {}
            Some(&"add") => {
                if words.len() != 2 {
                    eprintln!("Usage: add <name>");
                } else {
                    match game.add_player(words[1]) {
                        Err(e) => eprintln!("{}", e),
                        Ok(p) => println!("Added {}", p.name()),
                    }
                }
            }
            Some(&"start") => match game.start_turn() {
                Err(e) => eprintln!("{}", e),
                Ok(values) => show_roll(game, &values),
            },
            Some(&"keep") => {
                if words.len() < 2 {
                    eprintln!("Usage: keep <i> [i ...] | keep all <face>");
                } else {
                    do_keep(game, &words[1..]);
                }
            }
            Some(&"roll") => match game.roll_again() {
                Err(e) => eprintln!("{}", e),
                Ok(values) => show_roll(game, &values),
            },
            Some(&"bank") => match game.bank() {
                Err(e) => eprintln!("{}", e),
                Ok(total) => {
                    println!("Banked. Total now {}.", total);
                    if game.is_game_over() {
                        // unwrap ok: a game cannot be won without a player
                        println!("{} wins!", game.current_player().unwrap().name());
                    }
                }
            },
            Some(&"state") => {
                // unwrap ok: snapshots always serialize
                println!("{}", serde_json::to_string_pretty(&game.state()).unwrap());
            }
            Some(&"actions") => {
                let actions: Vec<String> = game
                    .available_actions()
                    .iter()
                    .map(|a| format!("{}", a))
                    .collect();
                println!("{}", actions.join(" "));
            }
            Some(&"new") => {
                *game = Game::new(config, Box::new(FairDie::new()));
                println!("New game.");
            }
            Some(&"help") => print_help(),
            Some(&"quit") | Some(&"exit") => break,
            Some(cmd) => eprintln!("Unknown command {}", cmd),
        }
        print!("> ");
        let _ = io::stdout().flush();
    }
}

fn play(args: &ArgMatches) -> Result<(), ()> {
    let config = load_config(args)?;
    let roll_gen: Box<dyn RollGen> = if let Some(fname) = args.value_of("rolls") {
        let fd = match OpenOptions::new().read(true).open(fname) {
            Err(e) => {
                eprintln!("Error opening input --rolls {}: {}", fname, e);
                return Err(());
            }
            Ok(fd) => fd,
        };
        let vals: Vec<u8> = ValueIter::new(fd).collect();
        Box::new(ScriptedRolls::new(&vals))
    } else {
        Box::new(FairDie::new())
    };
    let mut game = Game::new(&config, roll_gen);
    if let Some(names) = args.values_of("players") {
        for name in names {
            if let Err(e) = game.add_player(name) {
                eprintln!("{}", e);
            }
        }
    }
    if game.available_actions().contains(&Action::AddPlayer) {
        println!("Add at least one player to get going.");
    }
    repl(&mut game, &config);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let args = App::new(crate_name!())
        .version(crate_version!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .default_value(conf_def::CONFIG)
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("play")
                .about("Play an interactive game")
                .arg(
                    Arg::with_name("players")
                        .long("players")
                        .value_name("NAME")
                        .takes_value(true)
                        .multiple(true)
                        .help("Players to seat before the game starts"),
                )
                .arg(
                    Arg::with_name("rolls")
                        .long("rolls")
                        .value_name("FILE")
                        .help("Replay die faces from this file, then roll fair"),
                ),
        )
        .subcommand(
            SubCommand::with_name("simulate")
                .about("Run many single-bot games and report turns to win")
                .arg(
                    Arg::with_name("dieweights")
                        .long("die-weights")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::with_name("bankat")
                        .long("bank-at")
                        .value_name("PTS")
                        .default_value(conf_def::BANK_AT)
                        .validator(|v| validate_as!(u32, v))
                        .help("Bank once the turn score reaches this"),
                )
                .arg(
                    Arg::with_name("maxturns")
                        .long("max-turns")
                        .value_name("N")
                        .default_value(conf_def::MAX_TURNS)
                        .validator(|v| validate_as!(u32, v))
                        .help("Give up on a game after this many turns"),
                )
                .arg(
                    Arg::with_name("numgames")
                        .long("num-games")
                        .value_name("N")
                        .default_value(conf_def::NUM_GAMES)
                        .validator(|v| validate_as!(u32, v))
                        .help("How many games to simulate"),
                ),
        )
        .subcommand(
            SubCommand::with_name("parserolls")
                .about("Input observed die faces and output a weight table for simulate")
                .arg(
                    Arg::with_name("input")
                        .short("i")
                        .long("input")
                        .default_value("/dev/stdin"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .default_value("/dev/stdout"),
                ),
        )
        .get_matches();
    let _res = if let Some(args) = args.subcommand_matches("play") {
        play(args)
    } else if let Some(args) = args.subcommand_matches("simulate") {
        simulate(args)
    } else if let Some(args) = args.subcommand_matches("parserolls") {
        parse_rolls(args)
    } else if args.subcommand_name().is_none() {
        eprintln!("Must provide subcommand");
        Err(())
    } else {
        eprintln!("Unknown subcommand {}", args.subcommand_name().unwrap());
        Err(())
    };
}
