//! Binary persistence of compiled languages.
//!
//! All integers are `i32` little-endian. Strings are written as their byte
//! length followed by the UTF-8 bytes. Symbols are referred to by name, so a
//! loaded language may number its symbols differently from the saved one.

use crate::{
    grammar::{Environment, GrammarError, ProductionID},
    language::Language,
    lr0::StateID,
    symbol::is_terminal_name,
    table::{Action, LRTable},
};
use std::{
    io::{self, Read, Write},
    string::FromUtf8Error,
};

/// The maximum byte length of a serialized string.
pub const MAX_SERIALIZABLE_CHARACTERS: usize = 256;

const SHIFT: i32 = 0;
const REDUCE: i32 = 1;
const ACCEPT: i32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("string of {len} bytes exceeds the limit of {} bytes", MAX_SERIALIZABLE_CHARACTERS)]
    StringTooLong { len: usize },

    #[error("negative length {len}")]
    NegativeLength { len: i32 },

    #[error("invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("the stored grammar is invalid: {0}")]
    Grammar(#[from] GrammarError),

    #[error("corrupt table: {reason}")]
    Corrupt { reason: String },
}

impl SerializeError {
    fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
        }
    }
}

impl Language {
    /// Write the grammar and the compiled table to `writer`.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SerializeError> {
        let _span = tracing::trace_span!("save").entered();

        let env = self.environment();
        let symbols = env.symbols();
        let mut w = Encoder { writer };

        let user_defined = |terminal: bool| {
            symbols
                .iter()
                .filter(move |s| !s.id().is_builtin() && s.is_terminal() == terminal)
                .map(|s| s.name())
                .collect::<Vec<_>>()
        };
        for names in [user_defined(true), user_defined(false)] {
            w.write_len(names.len())?;
            for name in names {
                w.write_str(name)?;
            }
        }

        let grammars = &env.grammars()[1..];
        w.write_len(grammars.len())?;
        for grammar in grammars {
            w.write_str(symbols.name(grammar.lhs()))?;
            w.write_len(grammar.condinates().len())?;
            for condinate in grammar.condinates() {
                w.write_len(condinate.len())?;
                for symbol in condinate.symbols() {
                    w.write_str(symbols.name(*symbol))?;
                }
                match condinate.action() {
                    Some(action) => w.write_str(&action.to_string())?,
                    None => w.write_str("")?,
                }
            }
        }

        let table = self.table();
        w.write_len(table.len())?;

        let actions: Vec<_> = table
            .rows()
            .iter()
            .enumerate()
            .flat_map(|(state, row)| row.actions.iter().map(move |(s, a)| (state, *s, *a)))
            .collect();
        w.write_len(actions.len())?;
        for (state, symbol, action) in actions {
            w.write_len(state)?;
            w.write_str(symbols.name(symbol))?;
            let (kind, param) = match action {
                Action::Shift(next) => (SHIFT, next.index() as i32),
                Action::Reduce(production) => (REDUCE, production.raw() as i32),
                Action::Accept => (ACCEPT, 0),
            };
            w.write_i32(kind)?;
            w.write_i32(param)?;
        }

        let gotos: Vec<_> = table
            .rows()
            .iter()
            .enumerate()
            .flat_map(|(state, row)| row.gotos.iter().map(move |(s, t)| (state, *s, *t)))
            .collect();
        w.write_len(gotos.len())?;
        for (state, symbol, target) in gotos {
            w.write_len(state)?;
            w.write_str(symbols.name(symbol))?;
            w.write_len(target.index())?;
        }

        w.writer.flush()?;
        Ok(())
    }

    /// Restore a language written by [`Language::save`].
    pub fn load<R: Read>(reader: R) -> Result<Self, SerializeError> {
        let _span = tracing::trace_span!("load").entered();

        let mut r = Decoder { reader };

        let terminals = r.read_names()?;
        if let Some(name) = terminals.iter().find(|name| !is_terminal_name(name)) {
            return Err(SerializeError::corrupt(format!("`{}` is not a terminal", name)));
        }
        let nonterminals = r.read_names()?;
        if let Some(name) = nonterminals.iter().find(|name| is_terminal_name(name)) {
            return Err(SerializeError::corrupt(format!("`{}` is not a nonterminal", name)));
        }

        let mut grammars = vec![];
        for _ in 0..r.read_len()? {
            let lhs = r.read_str()?;
            let mut alternatives = vec![];
            for _ in 0..r.read_len()? {
                let mut rhs = vec![];
                for _ in 0..r.read_len()? {
                    rhs.push(r.read_str()?);
                }
                let action = r.read_str()?;
                alternatives.push((rhs, action));
            }
            grammars.push((lhs, alternatives));
        }

        let env = Environment::define(|def| {
            for name in terminals.iter().chain(&nonterminals) {
                def.symbol(name)?;
            }
            let resolve = |name: &str| {
                def.symbols()
                    .get(name)
                    .ok_or_else(|| GrammarError::from(format!("unknown symbol `{}`", name)))
            };
            let mut resolved = vec![];
            for (lhs, alternatives) in &grammars {
                let lhs = resolve(lhs.as_str())?;
                for (rhs, action) in alternatives {
                    let rhs = rhs
                        .iter()
                        .map(|name| resolve(name.as_str()))
                        .collect::<Result<Vec<_>, _>>()?;
                    resolved.push((lhs, rhs, action.as_str()));
                }
            }
            for (lhs, rhs, action) in resolved {
                def.restore_alternative(lhs, action, rhs)?;
            }
            Ok(())
        })?;

        let symbols = env.symbols();
        let states = r.read_len()?;

        // Entries are read before the rows are allocated, so that a corrupt
        // state count is caught by the bound below.
        let mut actions = vec![];
        for _ in 0..r.read_len()? {
            let state = r.read_len()?;
            let symbol = r.read_str()?;
            let kind = r.read_i32()?;
            let param = r.read_i32()?;
            actions.push((state, symbol, kind, param));
        }
        let mut gotos = vec![];
        for _ in 0..r.read_len()? {
            let state = r.read_len()?;
            let symbol = r.read_str()?;
            let target = r.read_len()?;
            gotos.push((state, symbol, target));
        }

        // Every state but the initial one is the target of a shift or a goto.
        if states > actions.len() + gotos.len() + 1 {
            return Err(SerializeError::corrupt(format!(
                "{} states cannot be reached by {} entries",
                states,
                actions.len() + gotos.len()
            )));
        }

        let mut table = LRTable::new(states);
        let state_id = |raw: usize| {
            if raw < states {
                Ok(StateID::from_raw(raw as u32))
            } else {
                Err(SerializeError::corrupt(format!("state {} out of range", raw)))
            }
        };
        let symbol_id = |name: &str, terminal: bool| {
            symbols
                .get(name)
                .filter(|id| symbols.is_terminal(*id) == terminal)
                .ok_or_else(|| SerializeError::corrupt(format!("unexpected symbol `{}`", name)))
        };

        for (state, symbol, kind, param) in actions {
            let state = state_id(state)?;
            let symbol = symbol_id(&symbol, true)?;
            let action = match kind {
                SHIFT => Action::Shift(state_id(to_len(param)?)?),
                REDUCE => {
                    let production = ProductionID::from_raw(param as u32);
                    if env.get_production(production).is_none() {
                        return Err(SerializeError::corrupt(format!(
                            "production {:?} out of range",
                            production
                        )));
                    }
                    Action::Reduce(production)
                }
                ACCEPT => Action::Accept,
                kind => {
                    return Err(SerializeError::corrupt(format!("unknown action kind {}", kind)))
                }
            };
            if table.insert_action(state, symbol, action).is_some() {
                return Err(SerializeError::corrupt(format!(
                    "duplicated action on ({:?}, `{}`)",
                    state,
                    symbols.name(symbol)
                )));
            }
        }

        for (state, symbol, target) in gotos {
            let state = state_id(state)?;
            let symbol = symbol_id(&symbol, false)?;
            let target = state_id(target)?;
            table.insert_goto(state, symbol, target);
        }

        Ok(Language::from_parts(env, table))
    }
}

struct Encoder<W> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    fn write_i32(&mut self, value: i32) -> Result<(), SerializeError> {
        self.writer.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<(), SerializeError> {
        let len = i32::try_from(len)
            .map_err(|_| SerializeError::corrupt(format!("length {} does not fit in i32", len)))?;
        self.write_i32(len)
    }

    fn write_str(&mut self, s: &str) -> Result<(), SerializeError> {
        if s.len() > MAX_SERIALIZABLE_CHARACTERS {
            return Err(SerializeError::StringTooLong { len: s.len() });
        }
        self.write_len(s.len())?;
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }
}

struct Decoder<R> {
    reader: R,
}

impl<R: Read> Decoder<R> {
    fn read_i32(&mut self) -> Result<i32, SerializeError> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_len(&mut self) -> Result<usize, SerializeError> {
        to_len(self.read_i32()?)
    }

    fn read_str(&mut self) -> Result<String, SerializeError> {
        let len = self.read_len()?;
        if len > MAX_SERIALIZABLE_CHARACTERS {
            return Err(SerializeError::StringTooLong { len });
        }
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    fn read_names(&mut self) -> Result<Vec<String>, SerializeError> {
        let mut names = vec![];
        for _ in 0..self.read_len()? {
            names.push(self.read_str()?);
        }
        Ok(names)
    }
}

fn to_len(value: i32) -> Result<usize, SerializeError> {
    usize::try_from(value).map_err(|_| SerializeError::NegativeLength { len: value })
}
