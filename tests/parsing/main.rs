#[cfg(test)]
mod verify {
    use std::path::Path;
    use std::rc::Rc;

    use tinymoe::language::*;
    use tinymoe::lexing::tokenize;
    use tinymoe::parsing::{self, AssignableCount, Frame, Parser, SourceError, SymbolTable};

    fn statements(table: &SymbolTable, source: &str) -> Vec<String> {
        let tokens = tokenize(source).unwrap();
        let parser = Parser::new(&tokens, table);
        parser
            .parse_statement(0)
            .unwrap()
            .iter()
            .map(|(_, expression)| expression.to_log())
            .collect()
    }

    fn program(source: &str) -> Vec<String> {
        parsing::parse(Path::new("verify.tm"), source)
            .unwrap()
            .statements
            .iter()
            .map(|statement| {
                statement
                    .expression
                    .to_log()
            })
            .collect()
    }

    fn repeat() -> GrammarSymbol {
        let body = GrammarSymbol::builder(SymbolKind::Sentence, Target::Custom)
            .keyword("continue")
            .build();
        GrammarSymbol::builder(SymbolKind::Block, Target::Custom)
            .keyword("repeat")
            .keyword("with")
            .callable(FragmentKind::Argument, body)
            .keyword("from")
            .placeholder(FragmentKind::Expression)
            .build()
    }

    #[test]
    fn identities_list_every_spelling() {
        let one = GrammarSymbol::builder(SymbolKind::Phrase, Target::Custom)
            .keywords(&["sum", "total"])
            .keyword("of")
            .placeholder(FragmentKind::List)
            .build();
        let two = GrammarSymbol::builder(SymbolKind::Phrase, Target::Custom)
            .keywords(&["sum", "total"])
            .keyword("of")
            .placeholder(FragmentKind::List)
            .build();

        assert_eq!(one.unique_id(), two.unique_id());
        assert_eq!(one.unique_id(), "sum/total of <list>");
    }

    #[test]
    fn shadowing_prefers_the_innermost_frame() {
        let mut table = SymbolTable::new();
        let outer = table.register(GrammarSymbol::variable(&["x"]));

        {
            let mut inner = table.enter();
            let shadow = inner.register(GrammarSymbol::variable(&["x"]));

            let found = inner.lookup("x");
            assert_eq!(found.len(), 2);
            assert!(Rc::ptr_eq(&found[0], &shadow));
            assert!(Rc::ptr_eq(&found[1], &outer));
        }

        // leaving the scope forgets the shadow
        let found = table.lookup("x");
        assert_eq!(found.len(), 1);
        assert!(Rc::ptr_eq(&found[0], &outer));
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn block_bodies_bring_their_sentences_into_scope() {
        let mut table = SymbolTable::new();
        let symbol = table.register(repeat());

        assert!(table
            .lookup("continue")
            .is_empty());

        {
            let body = table.enter_body(&symbol);
            assert_eq!(
                statements(&body, "continue"),
                vec!["[continue]()"]
            );
        }

        assert!(table
            .lookup("continue")
            .is_empty());

        let frame = Frame::body_of(&symbol);
        assert_eq!(
            frame
                .symbols()
                .len(),
            1
        );
    }

    #[test]
    fn the_base_frame_is_never_popped() {
        let mut table = SymbolTable::new();
        assert!(table
            .pop()
            .is_none());
        assert!(table
            .resolve("the result")
            .is_some());
    }

    #[test]
    fn precedence_across_every_tier() {
        let table = SymbolTable::new();
        assert_eq!(
            statements(&table, "set x to 1 + 2 * 3 & \"a\" = \"3a\" and not false or true"),
            vec!["[set <assignable> to <expression>]($(x), (((((1 + (2 * 3)) & \"a\") = \"3a\") and (not [false])) or [true]))"]
        );
    }

    #[test]
    fn ambiguous_statements_return_every_reading() {
        let mut table = SymbolTable::new();
        table.register(
            GrammarSymbol::builder(SymbolKind::Sentence, Target::Custom)
                .keyword("print")
                .placeholder(FragmentKind::Expression)
                .build(),
        );
        table.register(
            GrammarSymbol::builder(SymbolKind::Sentence, Target::Custom)
                .keyword("print")
                .placeholder(FragmentKind::Primitive)
                .build(),
        );

        let readings = statements(&table, "print 1");
        assert_eq!(readings.len(), 2);

        // only the expression slot can take a sum
        let readings = statements(&table, "print 1 + 1");
        assert_eq!(readings, vec!["[print <expression>]((1 + 1))"]);
    }

    #[test]
    fn assignables_classify_existing_and_new_names() {
        let mut table = SymbolTable::new();
        table.register(GrammarSymbol::variable(&["a"]));
        table.register(
            GrammarSymbol::builder(SymbolKind::Sentence, Target::Custom)
                .keyword("swap")
                .placeholder(FragmentKind::Assignable)
                .keyword("with")
                .placeholder(FragmentKind::Assignable)
                .build(),
        );

        let tokens = tokenize("swap a with b").unwrap();
        let parser = Parser::new(&tokens, &table);
        let readings = parser
            .parse_statement(0)
            .unwrap();
        assert_eq!(readings.len(), 1);

        let statement = &readings[0].1;
        assert_eq!(
            statement.to_log(),
            "[swap <assignable> with <assignable>]([a], $(b))"
        );
        assert_eq!(
            parsing::count_statement_assignables(&statement.assignable_arguments()),
            AssignableCount::Legal(1)
        );
    }

    #[test]
    fn field_access_cannot_be_assigned() {
        let mut table = SymbolTable::new();
        table.register(GrammarSymbol::variable(&["b"]));
        table.register(
            GrammarSymbol::builder(SymbolKind::Sentence, Target::Custom)
                .keyword("increase")
                .placeholder(FragmentKind::Assignable)
                .build(),
        );

        let tokens = tokenize("increase field a of b").unwrap();
        let parser = Parser::new(&tokens, &table);

        // the field access is the only reading of the whole slot
        let slot = parser
            .parse_assignable(1)
            .unwrap();
        let whole: Vec<&Expression> = slot
            .iter()
            .filter(|(next, _)| *next == tokens.len())
            .map(|(_, expression)| expression)
            .collect();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].to_log(), "[field <argument> of <primitive>]($(a), [b])");
        assert_eq!(
            parsing::count_statement_assignables(&whole),
            AssignableCount::Illegal(whole[0].clone())
        );

        let error = parser
            .parse_statement(0)
            .unwrap_err();
        assert!(error
            .message()
            .contains("something assignable"));
    }

    #[test]
    fn new_names_become_variables_on_later_lines() {
        let logs = program("set the total to 0\nset the total to the total + 1\n");
        assert_eq!(
            logs,
            vec![
                "[set <assignable> to <expression>]($(the total), 0)",
                "[set <assignable> to <expression>]([the total], ([the total] + 1))",
            ]
        );
    }

    #[test]
    fn rendering_parses_back_to_the_same_tree() {
        let mut table = SymbolTable::new();
        table.register(GrammarSymbol::variable(&["a"]));
        table.register(GrammarSymbol::variable(&["f"]));
        table.register(
            GrammarSymbol::builder(SymbolKind::Phrase, Target::Custom)
                .keyword("sum")
                .keyword("from")
                .placeholder(FragmentKind::Expression)
                .keyword("to")
                .placeholder(FragmentKind::Expression)
                .build(),
        );

        for source in [
            "set x to (1 + 2) * 3",
            "set x to 1 - (2 - 3)",
            "set x to not (a = 1)",
            "set x to -(-1)",
            "set x to f of (1, \"two\", a) of ()",
            "set x to item 1 + 1 of array a",
            "set x to length of array a",
            "set x to a is not integer",
            "set x to new array of 3 items",
            "set field size of a to 2",
            "set item 0 of array a to \"a \\\"quoted\\\" word\"",
            "redirect to f",
            "set x to length of array (sum from 1 to 2) + 3",
            "set x to sum from 1 to sum from 2 to 3",
            "set x to (sum from 1 to 2) * 3",
            "set x to sum from (1 + 1) to 2",
        ] {
            let tokens = tokenize(source).unwrap();
            let parser = Parser::new(&tokens, &table);
            let readings = parser
                .parse_statement(0)
                .unwrap();
            assert_eq!(readings.len(), 1, "{}", source);
            let original = &readings[0].1;

            let code = original.to_code();
            let tokens = tokenize(&code).unwrap();
            let parser = Parser::new(&tokens, &table);
            let again = parser
                .parse_statement(0)
                .unwrap();
            assert_eq!(again.len(), 1, "{}", code);
            assert_eq!(again[0].1.to_log(), original.to_log(), "{}", code);
        }
    }

    #[test]
    fn errors_report_the_furthest_failure() {
        let errors = parsing::parse(Path::new("verify.tm"), "set x to (1 + 2\n").unwrap_err();
        assert_eq!(errors.len(), 1);

        match &errors[0] {
            SourceError::Parsing { position, error } => {
                assert_eq!(position.row, 0);
                assert_eq!(position.column, 15);
                assert!(error
                    .message()
                    .contains("\")\""));
            }
            other => panic!("expected a parsing error, not {:?}", other),
        }
    }

    #[test]
    fn errors_do_not_stop_later_lines() {
        let errors =
            parsing::parse(Path::new("verify.tm"), "set x\nset y to 1\nset z\n").unwrap_err();
        let rows: Vec<usize> = errors
            .iter()
            .map(|error| match error {
                SourceError::Parsing { position, .. } => position.row,
                SourceError::Lexing(_) => usize::MAX,
            })
            .collect();
        assert_eq!(rows, vec![0, 2]);
    }
}
