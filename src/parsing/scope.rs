//! The scoped table of grammar symbols visible while parsing.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use tracing::debug;

use crate::language::{FragmentKind, GrammarSymbol, SymbolKind, Target};

/// The symbols declared by one lexical scope.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    symbols: Vec<Rc<GrammarSymbol>>,
}

impl Frame {
    pub fn new() -> Frame {
        Frame {
            symbols: Vec::new(),
        }
    }

    /// The frame every table starts with: built in types, values, phrases
    /// and statements.
    pub fn predefined() -> Frame {
        let mut frame = Frame::new();
        for symbol in predefined_symbols() {
            frame.add(symbol);
        }
        frame
    }

    /// The frame for the body of `symbol`: placeholders which take
    /// something callable make that callable's own shape available inside.
    pub fn body_of(symbol: &GrammarSymbol) -> Frame {
        let mut frame = Frame::new();
        for fragment in symbol.fragments() {
            if let Some(signature) = fragment.signature() {
                frame.insert(signature.clone());
            }
        }
        frame
    }

    pub fn symbols(&self) -> &[Rc<GrammarSymbol>] {
        &self.symbols
    }

    /// Add a symbol. Declaring the same shape twice in one frame replaces
    /// the earlier declaration; the replaced symbol is returned.
    pub fn add(&mut self, symbol: GrammarSymbol) -> Option<Rc<GrammarSymbol>> {
        self.insert(Rc::new(symbol))
    }

    fn insert(&mut self, symbol: Rc<GrammarSymbol>) -> Option<Rc<GrammarSymbol>> {
        match self
            .symbols
            .iter()
            .position(|existing| existing.unique_id() == symbol.unique_id())
        {
            Some(index) => Some(std::mem::replace(&mut self.symbols[index], symbol)),
            None => {
                self.symbols
                    .push(symbol);
                None
            }
        }
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    frames: Vec<Frame>,
    available: BTreeMap<String, Vec<Rc<GrammarSymbol>>>,
    result: Rc<GrammarSymbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// A fresh table holding only the predefined symbols.
    pub fn new() -> SymbolTable {
        let base = Frame::predefined();
        let result = base
            .symbols
            .iter()
            .find(|symbol| symbol.target() == Target::TheResult)
            .cloned()
            .unwrap_or_else(|| Rc::new(the_result()));

        let mut table = SymbolTable {
            frames: Vec::new(),
            available: BTreeMap::new(),
            result,
        };
        table.push(base);
        table
    }

    /// The symbol standing for the result of the last invocation.
    pub fn result_symbol(&self) -> &Rc<GrammarSymbol> {
        &self.result
    }

    /// How many frames have been pushed on top of the predefined one.
    pub fn depth(&self) -> usize {
        self.frames
            .len()
            .saturating_sub(1)
    }

    pub fn push(&mut self, frame: Frame) {
        for symbol in &frame.symbols {
            self.available
                .entry(
                    symbol
                        .unique_id()
                        .to_string(),
                )
                .or_default()
                .push(symbol.clone());
        }
        self.frames
            .push(frame);
        debug!("Pushed frame, depth {}", self.depth());
    }

    /// Remove the innermost frame and everything it declared. The
    /// predefined frame is never removed; popping it returns None.
    pub fn pop(&mut self) -> Option<Frame> {
        if self
            .frames
            .len()
            <= 1
        {
            return None;
        }

        let frame = self
            .frames
            .pop()?;
        for symbol in &frame.symbols {
            self.withdraw(symbol);
        }
        debug!("Popped frame, depth {}", self.depth());
        Some(frame)
    }

    fn withdraw(&mut self, symbol: &Rc<GrammarSymbol>) {
        let id = symbol.unique_id();
        if let Some(group) = self
            .available
            .get_mut(id)
        {
            if let Some(index) = group
                .iter()
                .rposition(|existing| Rc::ptr_eq(existing, symbol))
            {
                group.remove(index);
            }
            if group.is_empty() {
                self.available
                    .remove(id);
            }
        }
    }

    /// Declare a symbol in the innermost frame.
    pub fn register(&mut self, symbol: GrammarSymbol) -> Rc<GrammarSymbol> {
        let symbol = Rc::new(symbol);
        debug!("Registering {}", symbol.unique_id());

        let replaced = match self
            .frames
            .last_mut()
        {
            Some(frame) => frame.insert(symbol.clone()),
            None => {
                self.frames
                    .push(Frame::new());
                self.frames[0].insert(symbol.clone())
            }
        };

        let group = self
            .available
            .entry(
                symbol
                    .unique_id()
                    .to_string(),
            )
            .or_default();
        match replaced.and_then(|old| {
            group
                .iter()
                .rposition(|existing| Rc::ptr_eq(existing, &old))
        }) {
            Some(index) => group[index] = symbol.clone(),
            None => group.push(symbol.clone()),
        }

        symbol
    }

    /// Every symbol sharing the given identity, innermost first.
    pub fn lookup(&self, unique_id: &str) -> Vec<Rc<GrammarSymbol>> {
        match self
            .available
            .get(unique_id)
        {
            Some(group) => group
                .iter()
                .rev()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// The symbol a given identity currently means.
    pub fn resolve(&self, unique_id: &str) -> Option<&Rc<GrammarSymbol>> {
        self.available
            .get(unique_id)
            .and_then(|group| group.last())
    }

    /// The innermost symbol of every identity group, in identity order.
    pub fn visible(&self) -> impl Iterator<Item = &Rc<GrammarSymbol>> {
        self.available
            .values()
            .filter_map(|group| group.last())
    }

    /// Push an empty frame which is popped again when the returned guard is
    /// dropped.
    pub fn enter(&mut self) -> ScopeGuard<'_> {
        let depth = self
            .frames
            .len();
        self.push(Frame::new());
        ScopeGuard { table: self, depth }
    }

    /// Enter the body of the given symbol, until the returned guard is
    /// dropped.
    pub fn enter_body(&mut self, symbol: &GrammarSymbol) -> ScopeGuard<'_> {
        let frame = Frame::body_of(symbol);
        let depth = self
            .frames
            .len();
        self.push(frame);
        ScopeGuard { table: self, depth }
    }

    fn truncate(&mut self, depth: usize) {
        while self
            .frames
            .len()
            > depth.max(1)
        {
            if self
                .pop()
                .is_none()
            {
                break;
            }
        }
    }
}

/// A frame pushed for the lifetime of this guard. Whatever happens while it
/// is held, the table returns to its previous depth when it is dropped.
pub struct ScopeGuard<'t> {
    table: &'t mut SymbolTable,
    depth: usize,
}

impl Deref for ScopeGuard<'_> {
    type Target = SymbolTable;

    fn deref(&self) -> &SymbolTable {
        self.table
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut SymbolTable {
        self.table
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.table
            .truncate(self.depth);
    }
}

fn the_result() -> GrammarSymbol {
    GrammarSymbol::builder(SymbolKind::Symbol, Target::TheResult)
        .keyword("the")
        .keyword("result")
        .build()
}

fn predefined_symbols() -> Vec<GrammarSymbol> {
    use FragmentKind::*;

    let types = [
        ("object", Target::Object),
        ("array", Target::Array),
        ("symbol", Target::Symbol),
        ("boolean", Target::Boolean),
        ("integer", Target::Integer),
        ("float", Target::Float),
        ("string", Target::String),
        ("function", Target::Function),
    ];

    let mut symbols: Vec<GrammarSymbol> = types
        .iter()
        .map(|(name, target)| {
            GrammarSymbol::builder(SymbolKind::Type, *target)
                .keyword(name)
                .build()
        })
        .collect();

    for (name, target) in [
        ("true", Target::True),
        ("false", Target::False),
        ("null", Target::Null),
    ] {
        symbols.push(
            GrammarSymbol::builder(SymbolKind::Symbol, target)
                .keyword(name)
                .build(),
        );
    }
    symbols.push(the_result());

    let phrase = |target| GrammarSymbol::builder(SymbolKind::Phrase, target);
    let sentence = |target| GrammarSymbol::builder(SymbolKind::Sentence, target);

    symbols.extend([
        phrase(Target::Invoke)
            .placeholder(Primitive)
            .keyword("of")
            .placeholder(List)
            .build(),
        phrase(Target::InvokeContinuation)
            .keyword("continuation")
            .placeholder(Expression)
            .keyword("of")
            .placeholder(List)
            .build(),
        phrase(Target::NewTypeOfFields)
            .keyword("new")
            .placeholder(Type)
            .keyword("of")
            .placeholder(List)
            .build(),
        phrase(Target::NewArray)
            .keyword("new")
            .keyword("array")
            .keyword("of")
            .placeholder(Expression)
            .keyword("items")
            .build(),
        phrase(Target::GetArrayItem)
            .keyword("item")
            .placeholder(Expression)
            .keyword("of")
            .keyword("array")
            .placeholder(Primitive)
            .build(),
        phrase(Target::GetArrayLength)
            .keyword("length")
            .keyword("of")
            .keyword("array")
            .placeholder(Primitive)
            .build(),
        phrase(Target::IsType)
            .placeholder(Primitive)
            .keyword("is")
            .placeholder(Type)
            .build(),
        phrase(Target::IsNotType)
            .placeholder(Primitive)
            .keyword("is")
            .keyword("not")
            .placeholder(Type)
            .build(),
        phrase(Target::GetField)
            .keyword("field")
            .placeholder(Argument)
            .keyword("of")
            .placeholder(Primitive)
            .build(),
        sentence(Target::End)
            .keyword("end")
            .build(),
        GrammarSymbol::builder(SymbolKind::Block, Target::Select)
            .keyword("select")
            .placeholder(Expression)
            .build(),
        sentence(Target::Case)
            .keyword("case")
            .placeholder(Expression)
            .build(),
        sentence(Target::CaseElse)
            .keyword("case")
            .keyword("else")
            .build(),
        sentence(Target::RedirectTo)
            .keyword("redirect")
            .keyword("to")
            .placeholder(Expression)
            .build(),
        sentence(Target::Assign)
            .keyword("set")
            .placeholder(Assignable)
            .keyword("to")
            .placeholder(Expression)
            .build(),
        sentence(Target::SetArrayItem)
            .keyword("set")
            .keyword("item")
            .placeholder(Expression)
            .keyword("of")
            .keyword("array")
            .placeholder(Expression)
            .keyword("to")
            .placeholder(Expression)
            .build(),
        sentence(Target::SetField)
            .keyword("set")
            .keyword("field")
            .placeholder(Argument)
            .keyword("of")
            .placeholder(Expression)
            .keyword("to")
            .placeholder(Expression)
            .build(),
    ]);

    symbols
}
