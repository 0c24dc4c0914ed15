#[cfg(test)]
mod verify {
    use std::path::Path;

    use tinymoe::lowering::{self, ast};
    use tinymoe::parsing;

    fn lower(source: &str) -> ast::Declaration {
        let program = parsing::parse(Path::new("verify.tm"), source).unwrap();
        lowering::lower(&program).unwrap()
    }

    fn trim(s: &str) -> &str {
        s.strip_prefix('\n')
            .unwrap_or(s)
    }

    #[test]
    fn straight_line_assignments() {
        let declaration = lower("set x to 1\nset y to x + 2\n");

        assert_eq!(declaration.locals, vec!["x", "y"]);
        assert_eq!(
            declaration.to_string(),
            trim(
                r#"
function main($state, $continuation)
    var $the_result
    var x
    var y
    x = 1
    y = (x + 2)
    $continuation($state, $the_result)
end"#
            )
        );
    }

    #[test]
    fn select_blocks_lower_to_markers() {
        let declaration = lower(trim(
            r#"
select 1
    case 1
        set the result to true
    case else
        set the result to false
end
            "#,
        ));

        assert!(declaration
            .locals
            .is_empty());
        assert_eq!(
            declaration.to_string(),
            trim(
                r#"
function main($state, $continuation)
    var $the_result
    select 1
    case 1
    $the_result = true
    case else
    $the_result = false
    end
    $continuation($state, $the_result)
end"#
            )
        );
    }

    #[test]
    fn awaited_calls_capture_the_rest_of_the_block() {
        let declaration = lower("set k to 1\nset r to continuation k of (1, 2)\nset s to r\n");

        assert_eq!(
            declaration.to_string(),
            trim(
                r#"
function main($state, $continuation)
    var $the_result
    var k
    var r
    var s
    k = 1
    k([1, 2], $state, function ($state, $result_1)
        r = $result_1
        s = r
        $continuation($state, $the_result)
    end)
end"#
            )
        );
    }

    #[test]
    fn declarations_serialize() {
        let declaration = lower("set x to null\n");
        let json = serde_json::to_value(&declaration).unwrap();

        assert_eq!(json["name"], "main");
        assert_eq!(json["result"], "$the_result");
        assert_eq!(json["locals"], serde_json::json!(["x"]));
        assert_eq!(
            json["body"][0],
            serde_json::json!({"Assign": {"name": "x", "value": {"Literal": "Null"}}})
        );
    }
}
