use std::{fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, bail};
use automata_engine::{
    automaton::{
        FiniteStateMachine, JsonFormat, matcher::LongestMatch, mealy::MealyMachine,
        moore::MooreMachine, nfa::Nfa, pda::Pda, transducer::Transducer,
        turing::{TuringMachine, Verdict},
    },
    config::SimulationConfig,
    logger,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use itertools::Itertools;

#[derive(Parser, Debug)]
#[command(name = "automata")]
#[command(version = "0.1")]
#[command(about = "Simulate and convert finite, pushdown and Turing automata", long_about = None)]
pub struct Args {
    /// The automaton document to load.
    file: PathBuf,

    /// The kind of automaton. Inferred from the document if omitted.
    #[arg(short, long)]
    kind: Option<Kind>,

    /// A TOML file with simulation limits and logger settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Runs the automaton on an input and prints the history.
    Simulate { input: String },
    /// Converts an NFA into a DFA by subset construction.
    ToDfa,
    /// Minimizes a DFA.
    Minimize,
    /// Prints a right-linear grammar for the language of an NFA.
    Grammar {
        #[arg(long)]
        strict: bool,
    },
    /// Prints a summary of the automaton.
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Nfa,
    Pda,
    Moore,
    Mealy,
    Turing,
}

impl Kind {
    /// Guesses the kind from the fields only a single kind of document has.
    fn infer(document: &serde_json::Value) -> Kind {
        let has = |field: &str| document.get(field).is_some();
        let mealy_transitions = document
            .get("transitions")
            .and_then(|t| t.as_array())
            .is_some_and(|t| t.iter().any(|entry| entry.get("output").is_some()));

        if has("stack_alphabet") || has("start_stack_symbol") {
            Kind::Pda
        } else if has("blank_symbol") || has("tape_alphabet") {
            Kind::Turing
        } else if has("output_function") {
            Kind::Moore
        } else if mealy_transitions || has("output_alphabet") {
            Kind::Mealy
        } else {
            Kind::Nfa
        }
    }
}

impl FromStr for Kind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nfa" | "dfa" => Ok(Kind::Nfa),
            "pda" | "pushdown" => Ok(Kind::Pda),
            "moore" => Ok(Kind::Moore),
            "mealy" => Ok(Kind::Mealy),
            "turing" | "tm" => Ok(Kind::Turing),
            _ => Err(anyhow::anyhow!("Invalid automaton kind: {}", s)),
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Nfa => write!(f, "NFA"),
            Kind::Pda => write!(f, "PDA"),
            Kind::Moore => write!(f, "Moore"),
            Kind::Mealy => write!(f, "Mealy"),
            Kind::Turing => write!(f, "Turing"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = SimulationConfig::from_optional_file(args.config.as_ref())
        .context("failed to load the config file")?;
    logger::init(config.get_logger());

    let json = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let kind = match args.kind {
        Some(kind) => kind,
        None => Kind::infer(&serde_json::from_str(&json)?),
    };

    let result = match kind {
        Kind::Nfa => run_nfa(Nfa::from_json(&json)?, &args.command),
        Kind::Pda => run_pda(Pda::from_json(&json)?, &args.command, &config),
        Kind::Moore => run_transducer(MooreMachine::from_json(&json)?, kind, &args.command),
        Kind::Mealy => run_transducer(MealyMachine::from_json(&json)?, kind, &args.command),
        Kind::Turing => run_turing(TuringMachine::from_json(&json)?, &args.command, &config),
    };

    result.with_context(|| format!("failed to run {} command", kind))
}

fn print_verdict(accepted: bool) {
    if accepted {
        println!("{}", "accepted".green().bold());
    } else {
        println!("{}", "rejected".red().bold());
    }
}

fn print_summary(kind: Kind, automaton: &impl FiniteStateMachine) {
    println!("kind: {}", kind);
    println!(
        "states ({}): {}",
        automaton.state_count(),
        automaton.states().iter().join(", ")
    );
    println!(
        "start state: {}",
        automaton.start_state().map_or("-", String::as_str)
    );
}

fn unsupported(kind: Kind, command: &Command) -> anyhow::Result<()> {
    bail!("{:?} is only supported for NFAs, not for {}", command, kind)
}

fn run_nfa(nfa: Nfa, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Simulate { input } => {
            let run = nfa.simulate_history(input);
            print_verdict(run.accepted);
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::ToDfa => match nfa.to_dfa() {
            Some(dfa) => println!("{}", dfa.to_json()?),
            None => bail!("the automaton has no start state"),
        },
        Command::Minimize => println!("{}", nfa.minimize()?.to_json()?),
        Command::Grammar { strict } => print!("{}", nfa.to_regular_grammar(*strict)?),
        Command::Info => {
            print_summary(Kind::Nfa, &nfa);
            println!("alphabet: {}", nfa.alphabet().iter().join(", "));
            println!("transitions: {}", nfa.transition_count());
            println!("is dfa: {}", nfa.is_dfa());
            println!(
                "unreachable states: {}",
                nfa.unreachable_states().iter().join(", ")
            );
        }
    }
    Ok(())
}

fn run_pda(pda: Pda, command: &Command, config: &SimulationConfig) -> anyhow::Result<()> {
    match command {
        Command::Simulate { input } => {
            let run = pda.simulate_history_with(input, config, &LongestMatch)?;
            print_verdict(run.accepted);
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::Info => {
            print_summary(Kind::Pda, &pda);
            println!("input alphabet: {}", pda.input_alphabet().iter().join(", "));
            println!("stack alphabet: {}", pda.stack_alphabet().iter().join(", "));
            println!("transitions: {}", pda.transition_count());
        }
        _ => unsupported(Kind::Pda, command)?,
    }
    Ok(())
}

fn run_transducer<T>(machine: T, kind: Kind, command: &Command) -> anyhow::Result<()>
where
    T: Transducer,
{
    match command {
        Command::Simulate { input } => {
            let run = machine.simulate_history(input);
            match &run.output {
                Some(output) => println!("{} {}", "output:".green().bold(), output),
                None => println!("{}", "stuck".red().bold()),
            }
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::Info => print_summary(kind, &machine),
        _ => unsupported(kind, command)?,
    }
    Ok(())
}

fn run_turing(
    machine: TuringMachine,
    command: &Command,
    config: &SimulationConfig,
) -> anyhow::Result<()> {
    match command {
        Command::Simulate { input } => {
            let run = machine.simulate_history_with(input, config);
            match run.verdict {
                Verdict::Accepted => print_verdict(true),
                Verdict::Rejected => print_verdict(false),
                Verdict::Loop => println!("{}", "step limit reached".yellow().bold()),
            }
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::Info => {
            print_summary(Kind::Turing, &machine);
            println!("blank symbol: {}", machine.blank_symbol());
            println!("tape alphabet: {}", machine.tape_alphabet().iter().join(", "));
        }
        _ => unsupported(Kind::Turing, command)?,
    }
    Ok(())
}
