use crate::dex;
use crate::dex::code::CodeItem;
use crate::dex::instrs::{Instr, Instruction};
use crate::facts::signatures::MethodSig;
use crate::prelude::*;
use clap::ArgMatches;
use nu_ansi_term::Color;
use regex::Regex;
use std::fmt::Write;

pub fn run(args: &ArgMatches) -> DfResult<()> {
    init_logger(args);

    let inputs = args
        .get_many::<String>("input")
        .ok_or_else(|| DfError::BadArguments("--input needed".to_string()))?;
    let class_pattern = args
        .get_one::<String>("filter-class")
        .map(|r| Regex::new(r))
        .transpose()?;
    let method_pattern = args
        .get_one::<String>("filter-method")
        .map(|r| Regex::new(r))
        .transpose()?;
    let colored = !args.get_flag("no-color");

    for input in inputs {
        let container = dex::open(input)?;
        for class in container.classes() {
            let class_name = class.name();
            if !class_pattern
                .as_ref()
                .map_or(true, |r| r.is_match(&class_name))
            {
                continue;
            }
            for def in class.methods() {
                let Some(code) = def.code() else {
                    continue;
                };
                let sig = MethodSig::new(container.get(def.method())?);
                if !method_pattern
                    .as_ref()
                    .map_or(true, |r| r.is_match(sig.name()))
                {
                    continue;
                }
                if colored {
                    println!("[*] {}", Color::Green.bold().paint(sig.id()));
                } else {
                    println!("[*] {}", sig.id());
                }
                print!("{}", listing(code, colored));
            }
        }
    }

    Ok(())
}

/// Renders one `index: address mnemonic` line per instruction.
fn listing(code: &CodeItem, colored: bool) -> String {
    let mut out = String::new();
    for labeled in code.iter_labeled() {
        let instr = labeled.instr();
        let text = match instr {
            Instr::Unknown(..) | Instr::Optimized(..) if colored => {
                Color::Red.paint(instr.to_string()).to_string()
            }
            _ if colored && instr.is_payload() => {
                Color::DarkGray.paint(instr.to_string()).to_string()
            }
            _ => instr.to_string(),
        };
        // writing to a String cannot fail
        let _ = writeln!(out, "    {:>4}: {:04} {text}", labeled.index(), labeled.addr().0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_listing() {
        let code: CodeItem = serde_json::from_str(
            r#"{
                "registers_size": 2,
                "instructions": [
                    {"op": "const16", "args": [0, 7]},
                    {"op": "if-eqz", "args": [0, 3]},
                    {"op": "return", "args": 0},
                    {"op": "return-void"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(
            listing(&code, false),
            "       1: 0000 const/16\n       2: 0002 if-eqz\n       3: 0004 return\n       4: 0005 return-void\n"
        );
    }
}
