//! Recursive-descent parser for CMake text
//!
//! The parser walks the token stream once, building commands that carry
//! their exact original source text, then a post-pass folds balanced
//! guard/end-guard pairs (`if`/`endif`, `foreach`/`endforeach`) into command
//! groups with recursively parsed bodies. Interstitial whitespace and
//! comments become opaque text fragments so an untouched document
//! serializes back byte-for-byte.

use crate::ast::{Command, CommandGroup, Section, SectionItem, SectionStyle};
use crate::document::{ContentItem, Document};
use crate::error::ParseError;
use crate::lexer::{tokenize, Token};
use crate::ordering::GROUP_OPENERS;

/// Parse the full text of a build script into a document
pub fn parse(source: &str) -> Result<Document, ParseError> {
    let contents = parse_contents(source)?;
    let contents = match_command_groups(contents, 0);
    Ok(Document::from_contents(contents, 0))
}

/// Parse a text template holding exactly one command, e.g.
/// `"add_dependencies(target SOME_VAR)"`. Surrounding whitespace is
/// tolerated; anything else is an error.
pub fn parse_one(source: &str) -> Result<Command, ParseError> {
    let contents = parse_contents(source)?;
    let mut commands: Vec<Command> = Vec::new();
    let mut extras = 0;
    for item in contents {
        match item {
            ContentItem::Command(command) => commands.push(command),
            ContentItem::Text(text) if text.trim().is_empty() => {}
            _ => extras += 1,
        }
    }
    match (commands.len(), extras) {
        (1, 0) => Ok(commands.pop().expect("one command")),
        (found, extra) => Err(ParseError::NotASingleCommand {
            found: found + extra,
        }),
    }
}

fn parse_contents(source: &str) -> Result<Vec<ContentItem>, ParseError> {
    let mut parser = Parser::new(source)?;
    let mut contents = Vec::new();
    while let Some(token) = parser.peek() {
        if token.is_trivia() {
            let text = parser.bump().literal().to_string();
            contents.push(ContentItem::Text(text));
        } else if token.is_word() {
            contents.push(ContentItem::Command(parser.parse_command()?));
        } else {
            let token = parser.bump();
            return Err(ParseError::UnexpectedToken {
                token: token.literal().to_string(),
            });
        }
    }
    Ok(contents)
}

/// Fold `(guard, ..., end-guard)` runs into command groups, tracking depth
/// so same-named inner guards nest instead of closing early. An opener that
/// never finds its closer is flushed back into the content list unchanged -
/// a deliberately lenient fallback for malformed input.
fn match_command_groups(contents: Vec<ContentItem>, base_depth: usize) -> Vec<ContentItem> {
    let mut revised: Vec<ContentItem> = Vec::new();
    let mut collected: Vec<ContentItem> = Vec::new();
    let mut open: Option<Command> = None;
    let mut depth = base_depth;

    for item in contents {
        let opener_name = open.as_ref().map(|command| command.name.clone());
        match opener_name {
            None => {
                let is_opener = item
                    .as_command()
                    .is_some_and(|command| GROUP_OPENERS.contains(&command.name.as_str()));
                if is_opener {
                    let ContentItem::Command(command) = item else {
                        unreachable!("just checked");
                    };
                    open = Some(command);
                    depth = base_depth + 1;
                } else {
                    revised.push(item);
                }
            }
            Some(opener_name) => {
                let mut closes = false;
                if let Some(command) = item.as_command() {
                    if command.name == opener_name {
                        depth += 1;
                    } else if command.name == format!("end{}", opener_name) {
                        depth -= 1;
                        closes = depth == base_depth;
                    }
                }
                if closes {
                    let ContentItem::Command(close) = item else {
                        unreachable!("just checked");
                    };
                    let inner =
                        match_command_groups(std::mem::take(&mut collected), base_depth + 1);
                    let body = Document::from_contents(inner, base_depth + 1);
                    let group =
                        CommandGroup::new(open.take().expect("opener present"), body, close);
                    revised.push(ContentItem::Group(group));
                } else {
                    collected.push(item);
                }
            }
        }
    }

    if let Some(opener) = open {
        revised.push(ContentItem::Command(opener));
        revised.extend(collected);
    }
    revised
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self, ParseError> {
        Ok(Parser {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    /// The next token that is not whitespace, newline or comment
    fn next_real(&self) -> Option<&Token> {
        self.tokens[self.pos..].iter().find(|t| !t.is_trivia())
    }

    fn parse_command(&mut self) -> Result<Command, ParseError> {
        let name = self.bump().literal().to_string();
        let mut original = name.clone();
        let mut pre_paren = String::new();

        while matches!(self.peek(), Some(Token::Whitespace(_))) {
            let ws = self.bump();
            pre_paren.push_str(ws.literal());
            original.push_str(ws.literal());
        }
        match self.peek() {
            Some(Token::LeftParen) => {
                self.bump();
                original.push('(');
            }
            Some(other) => {
                return Err(ParseError::Expected {
                    expected: "opening parenthesis",
                    found: other.literal().to_string(),
                })
            }
            None => {
                return Err(ParseError::Expected {
                    expected: "opening parenthesis",
                    found: "end of input".to_string(),
                })
            }
        }

        let mut items: Vec<SectionItem> = Vec::new();
        let mut paren_depth = 1usize;
        while !self.at_end() {
            let starts_section = matches!(
                self.next_real(),
                Some(token) if token.is_word() || matches!(token, Token::Quoted(_))
            );
            if starts_section {
                let (section, consumed) = self.parse_section();
                items.push(SectionItem::Section(section));
                original.push_str(&consumed);
            } else {
                let token = self.bump();
                original.push_str(token.literal());
                match token {
                    Token::RightParen => {
                        paren_depth -= 1;
                        if paren_depth == 0 {
                            return Ok(Command::from_source(name, pre_paren, items, original));
                        }
                    }
                    Token::LeftParen => paren_depth += 1,
                    other => items.push(SectionItem::Text(other.literal().to_string())),
                }
            }
        }
        Err(ParseError::UnexpectedEof { command_name: name })
    }

    fn parse_section(&mut self) -> (Section, String) {
        let mut original = String::new();
        let mut style = SectionStyle::default();
        let mut name = String::new();

        while matches!(self.peek(), Some(token) if token.is_trivia()) {
            let token = self.bump();
            original.push_str(token.literal());
            style.prename.push_str(token.literal());
        }

        if matches!(self.peek(), Some(Token::CapsWord(_))) {
            let token = self.bump();
            name = token.literal().to_string();
            original.push_str(token.literal());
            style.name_value_sep.clear();
            while matches!(self.peek(), Some(token) if token.is_space()) {
                let ws = self.bump();
                original.push_str(ws.literal());
                style.name_value_sep.push_str(ws.literal());
            }
            if style.name_value_sep.is_empty() {
                style.name_value_sep = " ".to_string();
            }
        }

        let mut values: Vec<String> = Vec::new();
        let mut delimiters: Vec<String> = Vec::new();
        let mut current = String::new();
        loop {
            // Values continue until a keyword, a paren or the end of input
            // appears at the unparenthesized level
            let more_values = matches!(
                self.next_real(),
                Some(Token::Word(_)) | Some(Token::Quoted(_))
            );
            if !more_values {
                break;
            }
            let token = self.bump();
            original.push_str(token.literal());
            if token.is_space() {
                current.push_str(token.literal());
            } else {
                if !current.is_empty() {
                    if !delimiters.contains(&current) {
                        delimiters.push(current.clone());
                    }
                    current.clear();
                }
                match token {
                    // Quotes are stripped; downstream logic compares values unquoted
                    Token::Quoted(text) => values.push(text[1..text.len() - 1].to_string()),
                    other => values.push(other.literal().to_string()),
                }
            }
        }
        if !current.is_empty() && !delimiters.contains(&current) {
            delimiters.push(current);
        }
        if let Some(first) = delimiters.first() {
            // Non-uniform delimiter runs keep the first one seen; lossy on
            // purpose, matching the captured-style contract
            style.value_sep = first.clone();
        }

        (Section { name, values, style }, original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_command_with_keyword_section() {
        let doc = parse("foo(BAR a b)\n").unwrap();
        let commands = doc.commands("foo");
        assert_eq!(commands.len(), 1);
        let sections: Vec<&Section> = commands[0].sections().collect();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "BAR");
        assert_eq!(sections[0].values, vec!["a", "b"]);
        assert_eq!(doc.to_string(), "foo(BAR a b)\n");
    }

    #[test]
    fn test_anonymous_then_keyword_sections() {
        let cmd = parse_one("find_package(catkin REQUIRED COMPONENTS roscpp rospy)").unwrap();
        let sections: Vec<&Section> = cmd.sections().collect();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].name, "");
        assert_eq!(sections[0].values, vec!["catkin"]);
        assert_eq!(sections[1].name, "REQUIRED");
        assert!(sections[1].values.is_empty());
        assert_eq!(sections[2].name, "COMPONENTS");
        assert_eq!(sections[2].values, vec!["roscpp", "rospy"]);
    }

    #[test]
    fn test_guarded_block_becomes_group() {
        let doc = parse("if(X)\n  cmd(A)\nendif()\n").unwrap();
        let groups = doc.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].open.name, "if");
        assert_eq!(groups[0].close.name, "endif");
        assert_eq!(groups[0].body.commands("cmd").len(), 1);
        assert_eq!(groups[0].body.depth(), 1);
    }

    #[test]
    fn test_nested_same_kind_guards() {
        let doc = parse("if(A)\nif(B)\ncmd(x)\nendif()\nendif()\n").unwrap();
        let groups = doc.groups();
        assert_eq!(groups.len(), 1);
        let inner = groups[0].body.groups();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].body.commands("cmd").len(), 1);
        assert_eq!(inner[0].body.depth(), 2);
    }

    #[test]
    fn test_mixed_guards_nest_recursively() {
        let doc = parse("if(A)\nforeach(x ${xs})\ncmd(${x})\nendforeach()\nendif()\n").unwrap();
        let outer = doc.groups();
        assert_eq!(outer.len(), 1);
        let inner = outer[0].body.groups();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].open.name, "foreach");
    }

    #[test]
    fn test_unmatched_opener_is_flushed_not_fatal() {
        let source = "if(A)\ncmd(x)\n";
        let doc = parse(source).unwrap();
        assert!(doc.groups().is_empty());
        assert_eq!(doc.commands("if").len(), 1);
        assert_eq!(doc.commands("cmd").len(), 1);
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_unbalanced_parens_are_fatal() {
        let err = parse("install(FILES a\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedEof {
                command_name: "install".to_string()
            }
        );
    }

    #[test]
    fn test_stray_paren_at_top_level() {
        let err = parse(")\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                token: ")".to_string()
            }
        );
    }

    #[test]
    fn test_word_without_parens() {
        let err = parse("foo bar\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::Expected {
                expected: "opening parenthesis",
                found: "bar".to_string()
            }
        );
    }

    #[test]
    fn test_pre_paren_whitespace_preserved() {
        let doc = parse("foo ()\n").unwrap();
        assert_eq!(doc.commands("foo")[0].pre_paren, " ");
        assert_eq!(doc.to_string(), "foo ()\n");
    }

    #[test]
    fn test_nested_parens_inside_arguments() {
        let source = "if((A AND B) OR C)\nendif()\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_quoted_value_is_stored_unquoted() {
        let cmd = parse_one("add_definitions(\"-DSOME FLAG\")").unwrap();
        let sections: Vec<&Section> = cmd.sections().collect();
        assert_eq!(sections[0].values, vec!["-DSOME FLAG"]);
    }

    #[test]
    fn test_comments_between_commands_are_fragments() {
        let source = "# header\nproject(foo)\n# footer\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.to_string(), source);
        assert!(matches!(&doc.contents()[0], ContentItem::Text(t) if t == "# header\n"));
    }

    #[test]
    fn test_first_seen_delimiter_wins() {
        let mut cmd = parse_one("catkin_package(CATKIN_DEPENDS roscpp  rospy   std_msgs)").unwrap();
        let section = cmd.get_section("CATKIN_DEPENDS").unwrap().clone();
        assert_eq!(section.style.value_sep, "  ");
        // A dirty re-render reproduces every value with the first delimiter
        cmd.mark_dirty();
        assert_eq!(
            cmd.to_string(),
            "catkin_package(CATKIN_DEPENDS roscpp  rospy  std_msgs)"
        );
    }

    #[test]
    fn test_multiline_section_style_capture() {
        let source = "catkin_package(\n    INCLUDE_DIRS include\n    LIBRARIES foo\n)\n";
        let doc = parse(source).unwrap();
        let cmd = doc.commands("catkin_package")[0];
        let sections: Vec<&Section> = cmd.sections().collect();
        assert_eq!(sections[0].style.prename, "\n    ");
        assert_eq!(sections[0].name, "INCLUDE_DIRS");
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_parse_one_tolerates_trailing_newline() {
        let cmd = parse_one("add_dependencies(target SOME_VAR)\n").unwrap();
        assert_eq!(cmd.name, "add_dependencies");
        assert_eq!(cmd.get_tokens(), vec!["target", "SOME_VAR"]);
    }

    #[test]
    fn test_parse_one_rejects_multiple_commands() {
        let err = parse_one("foo()\nbar()\n").unwrap_err();
        assert_eq!(err, ParseError::NotASingleCommand { found: 2 });
    }

    #[test]
    fn test_lex_failure_propagates() {
        assert!(matches!(parse("foo()\r\n"), Err(ParseError::Lex(_))));
    }
}
