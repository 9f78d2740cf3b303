#[macro_use]
extern crate clap;

use asmvm::{Computer, MachineConfig, Program, TraceMode};
use clap::{Arg, SubCommand};
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::exit;

fn main() {
    let matches = app_from_crate!()
        .subcommand(
            SubCommand::with_name("translate")
                .about("Translate source text into an object image")
                .arg(Arg::with_name("INPUT").required(true).index(1))
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("OUTPUT"),
                )
                .arg(Arg::with_name("verbose").short("v").long("verbose")),
        )
        .subcommand(
            SubCommand::with_name("exec")
                .about("Execute an object image")
                .arg(Arg::with_name("OBJECT").required(true).index(1))
                .arg(trace_arg())
                .arg(memory_arg()),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Translate and immediately execute source text")
                .arg(Arg::with_name("INPUT").required(true).index(1))
                .arg(Arg::with_name("verbose").short("v").long("verbose"))
                .arg(trace_arg())
                .arg(memory_arg()),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("translate", Some(m)) => translate(m),
        ("exec", Some(m)) => exec(m),
        ("run", Some(m)) => run(m),
        _ => {
            eprintln!("expected one of: translate, exec, run (see --help)");
            exit(1);
        }
    };

    match result {
        Ok(code) => exit(code),
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    }
}

fn trace_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("trace")
        .long("trace")
        .takes_value(true)
        .possible_values(&["no", "inst", "tick"])
        .default_value("no")
}

fn memory_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("memory")
        .short("m")
        .long("memory")
        .takes_value(true)
        .value_name("CELLS")
}

fn parse_trace_mode(matches: &clap::ArgMatches) -> TraceMode {
    match matches.value_of("trace") {
        Some("inst") => TraceMode::Inst,
        Some("tick") => TraceMode::Tick,
        _ => TraceMode::No,
    }
}

fn parse_config(matches: &clap::ArgMatches) -> Result<MachineConfig, String> {
    let mut config = MachineConfig::default();
    if let Some(cells) = matches.value_of("memory") {
        config.memory_size = cells
            .parse()
            .map_err(|_| format!("invalid --memory value \"{}\"", cells))?;
    }
    Ok(config)
}

fn read_source(path: &Path) -> Result<String, String> {
    let file = File::open(path).map_err(|err| format!("reading \"{}\": {}", path.display(), err))?;
    let mut reader = BufReader::new(file);
    let mut source = String::new();
    reader
        .read_to_string(&mut source)
        .map_err(|err| format!("reading \"{}\": {}", path.display(), err))?;
    Ok(source)
}

fn translate(matches: &clap::ArgMatches) -> Result<i32, String> {
    let input_path = Path::new(matches.value_of("INPUT").unwrap());
    let verbose = matches.is_present("verbose");
    let source = read_source(input_path)?;

    let output = asmc::translate(&source).map_err(|err| err.to_string())?;
    if verbose {
        for warning in &output.warnings {
            eprintln!("warning: {}", warning);
        }
    }

    let output_path: PathBuf = matches
        .value_of("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("aimg"));

    asm_image::write_file(&output_path, &output.program).map_err(|err| err.to_string())?;
    if verbose {
        eprintln!("wrote {}", output_path.display());
    }
    Ok(0)
}

fn exec(matches: &clap::ArgMatches) -> Result<i32, String> {
    let object_path = Path::new(matches.value_of("OBJECT").unwrap());
    let program = asm_image::read_file(object_path).map_err(|err| err.to_string())?;
    let config = parse_config(matches)?;
    let trace = parse_trace_mode(matches);
    run_program(&program, config, trace)
}

fn run(matches: &clap::ArgMatches) -> Result<i32, String> {
    let input_path = Path::new(matches.value_of("INPUT").unwrap());
    let verbose = matches.is_present("verbose");
    let source = read_source(input_path)?;

    let output = asmc::translate(&source).map_err(|err| err.to_string())?;
    if verbose {
        for warning in &output.warnings {
            eprintln!("warning: {}", warning);
        }
    }

    let config = parse_config(matches)?;
    let trace = parse_trace_mode(matches);
    run_program(&output.program, config, trace)
}

fn run_program(program: &Program, config: MachineConfig, trace: TraceMode) -> Result<i32, String> {
    let mut computer = Computer::stdio(config);
    computer.load(program).map_err(|err| err.to_string())?;

    for snapshot in computer.execute(program, trace) {
        let snapshot = snapshot.map_err(|err| err.to_string())?;
        if trace != TraceMode::No {
            eprintln!(
                "tick: {}, inst: {}, rip: {}",
                snapshot.ticks,
                snapshot.insts,
                snapshot.registers[asmvm::RegisterId::RIP.index()]
            );
        }
    }
    Ok(0)
}
