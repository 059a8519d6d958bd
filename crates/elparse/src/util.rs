use crate::symbol::{SymbolID, SymbolTable};
use std::fmt;

struct DisplayFn<F>(F);

impl<F> fmt::Display for DisplayFn<F>
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0)(f)
    }
}

pub fn display_fn<F>(f: F) -> impl fmt::Display
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    DisplayFn(f)
}

/// Display a symbol sequence separated by spaces, or `epsilon` when empty.
pub fn display_symbols<'a>(symbols: &'a SymbolTable, seq: &'a [SymbolID]) -> impl fmt::Display + 'a {
    display_fn(move |f| {
        if seq.is_empty() {
            return f.write_str(symbols.name(SymbolID::EPSILON));
        }
        for (i, symbol) in seq.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(symbols.name(*symbol))?;
        }
        Ok(())
    })
}
