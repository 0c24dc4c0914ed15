//! Grammar symbols: the shapes of the syntactic forms a program can use.
//!
//! A symbol is an ordered list of fragments, each of which is either a fixed
//! keyword or a typed placeholder. Symbols of identical shape share an
//! identity string, which is what groups redefinitions and shadowing.

use std::fmt;
use std::rc::Rc;

use crate::language::Token;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Name,       // a keyword, e.g. [repeat with] the current number [from] 1
    Type,       // a type name, e.g. set names to new [hash set]
    Primitive,  // a primitive expression, e.g. sum from 1 to [10]
    Expression, // any expression, e.g. repeat with the current number from [1] to [100]
    List,       // a parenthesized tuple, e.g. collection of [("a", "b", "c")]
    Assignable, // an existing variable, or a new one if it does not resolve
    Argument,   // always a new name, bound in the block body
}

impl FragmentKind {
    fn marker(&self) -> &'static str {
        match self {
            FragmentKind::Name => "<name>",
            FragmentKind::Type => "<type>",
            FragmentKind::Primitive => "<primitive>",
            FragmentKind::Expression => "<expression>",
            FragmentKind::List => "<list>",
            FragmentKind::Assignable => "<assignable>",
            FragmentKind::Argument => "<argument>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    kind: FragmentKind,
    identifiers: Vec<String>,
    callable: Option<Rc<GrammarSymbol>>,
}

impl Fragment {
    pub fn keyword(spelling: &str) -> Fragment {
        Fragment::keywords(&[spelling])
    }

    /// A keyword that may be written with any one of several spellings.
    pub fn keywords(spellings: &[&str]) -> Fragment {
        Fragment {
            kind: FragmentKind::Name,
            identifiers: spellings
                .iter()
                .map(|spelling| spelling.to_string())
                .collect(),
            callable: None,
        }
    }

    pub fn placeholder(kind: FragmentKind) -> Fragment {
        debug_assert!(kind != FragmentKind::Name, "keywords need a spelling");
        Fragment {
            kind,
            identifiers: Vec::new(),
            callable: None,
        }
    }

    /// A placeholder whose argument is itself something callable, with the
    /// given shape.
    pub fn callable(kind: FragmentKind, signature: GrammarSymbol) -> Fragment {
        Fragment {
            callable: Some(Rc::new(signature)),
            ..Fragment::placeholder(kind)
        }
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn signature(&self) -> Option<&Rc<GrammarSymbol>> {
        self.callable
            .as_ref()
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind != FragmentKind::Name
    }

    /// Whether the given token is one of this keyword's spellings.
    pub fn accepts(&self, token: &Token) -> bool {
        self.kind == FragmentKind::Name
            && self
                .identifiers
                .iter()
                .any(|spelling| *spelling == token.value)
    }

    /// The spelling used when writing this keyword back out.
    pub fn spelling(&self) -> &str {
        self.identifiers
            .first()
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn unique_id_fragment(&self) -> String {
        match self.kind {
            FragmentKind::Name => self
                .identifiers
                .join("/"),
            kind => kind
                .marker()
                .to_string(),
        }
    }
}

/// What a symbol means when it is matched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Custom, // user defined

    Object,   // (type) object
    Array,    // (type) array
    Symbol,   // (type) symbol
    Boolean,  // (type) boolean
    Integer,  // (type) integer
    Float,    // (type) float
    String,   // (type) string
    Function, // (type) function

    True,      // (primitive) true
    False,     // (primitive) false
    Null,      // (primitive) null
    TheResult, // (primitive) the result

    Invoke,             // (phrase) <primitive> of <list>
    InvokeContinuation, // (phrase) continuation <expression> of <list>
    NewTypeOfFields,    // (phrase) new <type> of <list>
    NewArray,           // (phrase) new array of <expression> items
    GetArrayItem,       // (phrase) item <expression> of array <primitive>
    GetArrayLength,     // (phrase) length of array <primitive>
    IsType,             // (phrase) <primitive> is <type>
    IsNotType,          // (phrase) <primitive> is not <type>
    GetField,           // (phrase) field <argument> of <primitive>

    End,          // (sentence) end
    Select,       // (block) select <expression>
    Case,         // (sentence) case <expression>
    CaseElse,     // (sentence) case else
    RedirectTo,   // (sentence) redirect to <expression>
    Assign,       // (sentence) set <assignable> to <expression>
    SetArrayItem, // (sentence) set item <expression> of array <expression> to <expression>
    SetField,     // (sentence) set field <argument> of <expression> to <expression>
}

/// Where a symbol may appear.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Type,     // <type>
    Symbol,   // <primitive>, a plain value
    Phrase,   // <primitive>
    Sentence, // <sentence>
    Block,    // <block>
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrammarSymbol {
    fragments: Vec<Fragment>,
    unique_id: String,
    target: Target,
    kind: SymbolKind,
}

impl GrammarSymbol {
    pub fn new(kind: SymbolKind, target: Target, fragments: Vec<Fragment>) -> GrammarSymbol {
        let mut symbol = GrammarSymbol {
            fragments,
            unique_id: String::new(),
            target,
            kind,
        };
        symbol.calculate_unique_id();
        symbol
    }

    pub fn builder(kind: SymbolKind, target: Target) -> SymbolBuilder {
        SymbolBuilder {
            kind,
            target,
            fragments: Vec::new(),
        }
    }

    /// A user variable, named by one or more words.
    pub fn variable<S: AsRef<str>>(words: &[S]) -> GrammarSymbol {
        let fragments = words
            .iter()
            .map(|word| Fragment::keyword(word.as_ref()))
            .collect();
        GrammarSymbol::new(SymbolKind::Symbol, Target::Custom, fragments)
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn push_fragment(&mut self, fragment: Fragment) {
        self.fragments
            .push(fragment);
        self.calculate_unique_id();
    }

    /// The placeholder fragments, in declaration order. These line up one to
    /// one with the arguments of an invocation of this symbol.
    pub fn placeholders(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments
            .iter()
            .filter(|fragment| fragment.is_placeholder())
    }

    /// Symbols like `<primitive> of <list>` have to be matched by extending
    /// an already parsed primitive.
    pub fn is_left_recursive(&self) -> bool {
        self.fragments
            .len()
            > 1
            && self.fragments[0].kind() == FragmentKind::Primitive
    }

    fn calculate_unique_id(&mut self) {
        self.unique_id = self
            .fragments
            .iter()
            .map(Fragment::unique_id_fragment)
            .collect::<Vec<_>>()
            .join(" ");
    }
}

impl fmt::Display for GrammarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unique_id)
    }
}

pub struct SymbolBuilder {
    kind: SymbolKind,
    target: Target,
    fragments: Vec<Fragment>,
}

impl SymbolBuilder {
    pub fn keyword(mut self, spelling: &str) -> SymbolBuilder {
        self.fragments
            .push(Fragment::keyword(spelling));
        self
    }

    pub fn keywords(mut self, spellings: &[&str]) -> SymbolBuilder {
        self.fragments
            .push(Fragment::keywords(spellings));
        self
    }

    pub fn placeholder(mut self, kind: FragmentKind) -> SymbolBuilder {
        self.fragments
            .push(Fragment::placeholder(kind));
        self
    }

    pub fn callable(mut self, kind: FragmentKind, signature: GrammarSymbol) -> SymbolBuilder {
        self.fragments
            .push(Fragment::callable(kind, signature));
        self
    }

    pub fn build(self) -> GrammarSymbol {
        GrammarSymbol::new(self.kind, self.target, self.fragments)
    }
}
