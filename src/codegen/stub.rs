// Stub emission: one `(bytes) -> (bytes, error)` function per method.

use super::ResolvedType;
use super::alias::{AliasRegistry, OWN_PACKAGE_ALIAS, SERIALIZATION_ALIAS};
use super::comments::comment_lines;
use super::names::{exported_name, variable_name};
use super::printer::Printer;

/// Annotation scanned for by the bind generator. Must stay byte-for-byte stable.
pub const ANNOTATION_MARKER: &str = "// @protopy";

const MARKER_TOKEN: &str = "@protopy";
const DEFUSED_MARKER_TOKEN: &str = "@ protopy";

/// Identifiers already in scope inside every stub body.
const STUB_SCOPE: [&str; 5] = ["input", "output", "err", SERIALIZATION_ALIAS, OWN_PACKAGE_ALIAS];

/// Everything the emitter needs about one method.
#[derive(Debug, Clone, Copy)]
pub struct StubMethod<'a> {
    /// Declared method name.
    pub name: &'a str,
    pub input: &'a ResolvedType,
    pub output: &'a ResolvedType,
    /// Leading source comment, as protoc recorded it.
    pub comment: Option<&'a str>,
    /// Aliases of the file the stub is emitted into.
    pub aliases: &'a AliasRegistry,
}

/// Copied source comments must neither repeat the marker nor end an
/// enclosing block comment.
fn inert_comment_line(line: &str) -> String {
    line.replace(MARKER_TOKEN, DEFUSED_MARKER_TOKEN)
        .replace("*/", "* /")
}

/// Emit the stub block for `method`.
///
/// Streaming flags are deliberately not consulted: every method gets the
/// same unary byte-in/byte-out shape.
pub fn emit_stub(out: &mut Printer, method: &StubMethod<'_>) {
    let func_name = exported_name(method.name);
    let input_type = method.input.qualified();
    let output_type = method.output.qualified();
    let taken = |name: &str| STUB_SCOPE.contains(&name) || method.aliases.is_taken(name);
    let input_var = variable_name(&method.input.name, taken);
    let mut output_var = variable_name(&method.output.name, taken);
    if output_var == input_var {
        output_var = variable_name(&format!("{}Out", method.output.name), taken);
    }

    if let Some(comment) = method.comment {
        for line in comment_lines(comment) {
            out.line(inert_comment_line(&line));
        }
    }
    out.line(format!(
        "// {} deserializes a {} and serializes a {}.",
        func_name, input_type, output_type
    ));
    out.line(ANNOTATION_MARKER);
    out.line(format!(
        "func {}(input []byte) (output []byte, err error) {{",
        func_name
    ));
    out.indent();
    out.line(format!("{} := new({})", input_var, input_type));
    out.line(format!(
        "err = {}.Unmarshal(input, {})",
        SERIALIZATION_ALIAS, input_var
    ));
    out.line("if err != nil {");
    out.indent();
    out.line("return");
    out.outdent();
    out.line("}");
    out.line(format!(
        "// {}, err := your{}Implementation({})",
        output_var, func_name, input_var
    ));
    out.line(format!("{} := new({})", output_var, output_type));
    out.line(format!(
        "output, err = {}.Marshal({})",
        SERIALIZATION_ALIAS, output_var
    ));
    out.line("return");
    out.outdent();
    out.line("}");
    out.blank();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(alias: &str, name: &str) -> ResolvedType {
        ResolvedType {
            alias: alias.to_string(),
            name: name.to_string(),
            import_path: alias.to_string(),
        }
    }

    #[test]
    fn emits_five_parts_in_order() {
        let input = resolved("pb", "HelloRequest");
        let output = resolved("pb", "HelloResponse");
        let mut out = Printer::new();
        emit_stub(
            &mut out,
            &StubMethod {
                name: "say_hello",
                input: &input,
                output: &output,
                comment: None,
                aliases: &AliasRegistry::new("own"),
            },
        );

        let expected = "\
// SayHello deserializes a pb.HelloRequest and serializes a pb.HelloResponse.
// @protopy
func SayHello(input []byte) (output []byte, err error) {
\thelloRequest := new(pb.HelloRequest)
\terr = proto.Unmarshal(input, helloRequest)
\tif err != nil {
\t\treturn
\t}
\t// helloResponse, err := yourSayHelloImplementation(helloRequest)
\thelloResponse := new(pb.HelloResponse)
\toutput, err = proto.Marshal(helloResponse)
\treturn
}

";
        assert_eq!(out.as_str(), expected);
    }

    #[test]
    fn marker_directly_precedes_declaration_once() {
        let input = resolved("pb", "Ping");
        let output = resolved("pb", "Pong");
        let mut out = Printer::new();
        emit_stub(
            &mut out,
            &StubMethod {
                name: "Ping",
                input: &input,
                output: &output,
                comment: Some(" Pings.\n Mentions @protopy in passing.\n"),
                aliases: &AliasRegistry::new("own"),
            },
        );

        let text = out.as_str();
        assert_eq!(text.matches(MARKER_TOKEN).count(), 1);
        let lines: Vec<_> = text.lines().collect();
        let marker = lines.iter().position(|l| *l == ANNOTATION_MARKER).unwrap();
        assert!(lines[marker + 1].starts_with("func Ping("));
        assert_eq!(lines[0], "// Pings.");
        assert_eq!(lines[1], "// Mentions @ protopy in passing.");
    }

    #[test]
    fn same_input_and_output_type_gets_distinct_variables() {
        let message = resolved("pb", "Echo");
        let mut out = Printer::new();
        emit_stub(
            &mut out,
            &StubMethod {
                name: "Echo",
                input: &message,
                output: &message,
                comment: None,
                aliases: &AliasRegistry::new("own"),
            },
        );

        let text = out.as_str();
        assert!(text.contains("\techo := new(pb.Echo)"));
        assert!(text.contains("\techoOut := new(pb.Echo)"));
        assert!(text.contains("proto.Marshal(echoOut)"));
    }

    #[test]
    fn reserved_method_names_are_suffixed() {
        let input = resolved("pb", "Empty");
        let output = resolved("other", "Type");
        let mut out = Printer::new();
        emit_stub(
            &mut out,
            &StubMethod {
                name: "String",
                input: &input,
                output: &output,
                comment: None,
                aliases: &AliasRegistry::new("own"),
            },
        );

        let text = out.as_str();
        assert!(text.contains("func String_(input []byte)"));
        assert!(text.contains("\ttype_ := new(other.Type)"));
    }

    fn stub_text(input: &ResolvedType, output: &ResolvedType, aliases: &AliasRegistry) -> String {
        let mut out = Printer::new();
        emit_stub(
            &mut out,
            &StubMethod {
                name: "Call",
                input,
                output,
                comment: None,
                aliases,
            },
        );
        out.into_string()
    }

    #[test]
    fn variables_do_not_shadow_package_aliases() {
        let aliases = AliasRegistry::new("own");
        let text = stub_text(&resolved("pb", "Proto"), &resolved("pb", "Pb"), &aliases);
        assert!(text.contains("\tproto_ := new(pb.Proto)\n"));
        assert!(text.contains("\terr = proto.Unmarshal(input, proto_)\n"));
        assert!(text.contains("\tpb_ := new(pb.Pb)\n"));
        assert!(text.contains("\toutput, err = proto.Marshal(pb_)\n"));
    }

    #[test]
    fn variables_do_not_redeclare_parameters_or_results() {
        let aliases = AliasRegistry::new("own");
        let text = stub_text(&resolved("pb", "Input"), &resolved("pb", "Output"), &aliases);
        assert!(text.contains("\tinput_ := new(pb.Input)\n"));
        assert!(text.contains("\terr = proto.Unmarshal(input, input_)\n"));
        assert!(text.contains("\toutput_ := new(pb.Output)\n"));
        assert!(text.contains("\toutput, err = proto.Marshal(output_)\n"));

        let text = stub_text(&resolved("pb", "Err"), &resolved("pb", "Err"), &aliases);
        assert!(text.contains("\terr_ := new(pb.Err)\n"));
        assert!(text.contains("\terrOut := new(pb.Err)\n"));
        assert!(!text.contains("\terr :="));
    }

    #[test]
    fn variables_do_not_shadow_foreign_aliases() {
        let mut aliases = AliasRegistry::new("own");
        aliases.alias("example.com/types", "types");
        let text = stub_text(&resolved("types", "Types"), &resolved("pb", "Reply"), &aliases);
        assert!(text.contains("\ttypes_ := new(types.Types)\n"));
    }

    #[test]
    fn comment_cannot_close_enclosing_block() {
        let input = resolved("pb", "Req");
        let output = resolved("pb", "Resp");
        let mut out = Printer::new();
        emit_stub(
            &mut out,
            &StubMethod {
                name: "Hi",
                input: &input,
                output: &output,
                comment: Some(" Matches paths like a/*/b */ ok.\n"),
                aliases: &AliasRegistry::new("own"),
            },
        );

        let text = out.as_str();
        assert!(!text.contains("*/"));
        assert!(text.starts_with("// Matches paths like a/* /b * / ok.\n"));
    }
}
