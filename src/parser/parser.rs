use std::fmt;
use std::mem;

use crate::lexer::{Token, TokenType};
use crate::parser::ast::{Block, Expression, Program, Statement};

/*
The parser turns the scanner's flat token sequence back into the tree the
grammar implies. Statements are plain recursive descent; expressions use
Pratt parsing, where each token type carries a precedence and may have a
prefix role (it can begin an expression) and an infix role (it can extend
one). `parse_expression` builds a left operand from the current token's
prefix rule, then keeps folding it into larger infix nodes for as long as
the next token binds more tightly than the caller does.

The strict `minimum < precedence` comparison is what makes operators of
equal rank left-associative: on seeing a second `-` in `10 - 3 - 2` the
loop stops, hands `(10 - 3)` back to the caller, and the caller's own loop
wraps it as `((10 - 3) - 2)`.

Parsing is total. A malformed statement records an error and the parser
synchronizes: it discards tokens until the next statement boundary and
resumes there, so one typo yields one error instead of a cascade, and the
statements around it still come out whole.
*/

/// A parse diagnostic: what went wrong and the line of the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionError {
    pub message: String,
    pub line: usize,
}

impl fmt::Display for AssertionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[line {}] AssertionError: {}", self.line, self.message)
    }
}

impl std::error::Error for AssertionError {}

/// Binding power of the token that may extend the current expression.
/// Anything not in the table sits at `Lowest` and never extends one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,      // ==, !=
    LessGreater, // <, >
    Sum,         // +, -
    Product,     // *, /
    Prefix,      // -x, !x
    Call,        // f(x), xs[i]
}

impl Precedence {
    fn of(token_type: TokenType) -> Precedence {
        match token_type {
            TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
            TokenType::Less | TokenType::Greater => Precedence::LessGreater,
            TokenType::Plus | TokenType::Minus => Precedence::Sum,
            TokenType::Star | TokenType::Slash => Precedence::Product,
            TokenType::LeftParen | TokenType::LeftBracket => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<AssertionError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize();
                }
            }
        }

        Program {
            statements,
            errors: mem::take(&mut self.errors),
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, AssertionError> {
        match self.peek().token_type {
            TokenType::Let => self.parse_let_statement(),
            TokenType::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Result<Statement, AssertionError> {
        self.advance(); // the `let` keyword
        let name = self.consume(TokenType::Identifier)?.lexeme;
        self.consume(TokenType::Equal)?;
        let value = self.parse_expression(Precedence::Lowest)?;
        self.match_semicolon();
        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, AssertionError> {
        self.advance(); // the `return` keyword
        let value = self.parse_expression(Precedence::Lowest)?;
        self.match_semicolon();
        Ok(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, AssertionError> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.match_semicolon();
        Ok(Statement::Expression(expression))
    }

    fn parse_expression(&mut self, minimum: Precedence) -> Result<Expression, AssertionError> {
        let mut left = self.parse_prefix()?;

        while !self.check(TokenType::SemiColon)
            && minimum < Precedence::of(self.peek().token_type)
        {
            left = match self.peek().token_type {
                TokenType::LeftParen => self.parse_call(left)?,
                TokenType::LeftBracket => self.parse_index(left)?,
                _ => self.parse_infix(left)?,
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, AssertionError> {
        match self.peek().token_type {
            TokenType::Number => {
                let token = self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    Self::error(
                        &token,
                        format!("could not parse '{}' as an integer", token.lexeme),
                    )
                })?;
                Ok(Expression::IntegerLiteral(value))
            }
            TokenType::String => Ok(Expression::StringLiteral(self.advance().lexeme)),
            TokenType::True => {
                self.advance();
                Ok(Expression::BooleanLiteral(true))
            }
            TokenType::False => {
                self.advance();
                Ok(Expression::BooleanLiteral(false))
            }
            TokenType::Identifier => Ok(Expression::Identifier(self.advance().lexeme)),
            TokenType::Bang | TokenType::Minus => {
                let operator = self.advance().token_type;
                let right = self.parse_expression(Precedence::Prefix)?;
                Ok(Expression::Prefix {
                    operator,
                    right: Box::new(right),
                })
            }
            TokenType::LeftParen => self.parse_grouped_expression(),
            TokenType::If => self.parse_if_expression(),
            TokenType::Function => self.parse_function_literal(),
            TokenType::LeftBracket => {
                self.advance(); // the `[`
                let elements = self.parse_expression_list(TokenType::RightBracket)?;
                Ok(Expression::ArrayLiteral(elements))
            }
            _ => {
                let token = self.peek().clone();
                Err(Self::error(
                    &token,
                    format!("no prefix parse function for '{}'", token.token_type),
                ))
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> Result<Expression, AssertionError> {
        let operator = self.advance().token_type;
        let right = self.parse_expression(Precedence::of(operator))?;
        Ok(Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    // A group is the inner expression followed by exactly one `)`. Any
    // surplus closing paren is left in the stream and reported as its own
    // error, rather than silently swallowed.
    fn parse_grouped_expression(&mut self) -> Result<Expression, AssertionError> {
        self.advance(); // the `(`
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.consume(TokenType::RightParen)?;
        Ok(expression)
    }

    fn parse_if_expression(&mut self) -> Result<Expression, AssertionError> {
        self.advance(); // the `if` keyword
        self.consume(TokenType::LeftParen)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.consume(TokenType::RightParen)?;
        let consequence = self.parse_block()?;

        let alternative = if self.check(TokenType::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Expression::IfElse {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Result<Expression, AssertionError> {
        self.advance(); // the `fn` keyword
        self.consume(TokenType::LeftParen)?;

        let mut parameters = Vec::new();
        if !self.check(TokenType::RightParen) {
            parameters.push(self.consume(TokenType::Identifier)?.lexeme);
            while self.check(TokenType::Comma) {
                self.advance();
                parameters.push(self.consume(TokenType::Identifier)?.lexeme);
            }
        }
        self.consume(TokenType::RightParen)?;

        let body = self.parse_block()?;
        Ok(Expression::FunctionLiteral { parameters, body })
    }

    fn parse_call(&mut self, callee: Expression) -> Result<Expression, AssertionError> {
        self.advance(); // the `(`
        let arguments = self.parse_expression_list(TokenType::RightParen)?;
        Ok(Expression::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_index(&mut self, collection: Expression) -> Result<Expression, AssertionError> {
        self.advance(); // the `[`
        let index = self.parse_expression(Precedence::Lowest)?;
        self.consume(TokenType::RightBracket)?;
        Ok(Expression::Index {
            collection: Box::new(collection),
            index: Box::new(index),
        })
    }

    fn parse_expression_list(
        &mut self,
        end: TokenType,
    ) -> Result<Vec<Expression>, AssertionError> {
        let mut items = Vec::new();

        if !self.check(end) {
            items.push(self.parse_expression(Precedence::Lowest)?);
            while self.check(TokenType::Comma) {
                self.advance();
                items.push(self.parse_expression(Precedence::Lowest)?);
            }
        }

        self.consume(end)?;
        Ok(items)
    }

    fn parse_block(&mut self) -> Result<Block, AssertionError> {
        self.consume(TokenType::LeftBrace)?;

        let mut statements = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        self.consume(TokenType::RightBrace)?;
        Ok(Block { statements })
    }

    fn check(&self, token_type: TokenType) -> bool {
        if self.is_at_end() {
            return token_type == TokenType::Eof;
        }
        self.peek().token_type == token_type
    }

    fn consume(&mut self, token_type: TokenType) -> Result<Token, AssertionError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            let found = self.peek().clone();
            Err(Self::error(
                &found,
                format!(
                    "expected token '{}' but found '{}'",
                    token_type, found.token_type
                ),
            ))
        }
    }

    fn match_semicolon(&mut self) {
        if self.check(TokenType::SemiColon) {
            self.advance();
        }
    }

    fn error(token: &Token, message: String) -> AssertionError {
        AssertionError {
            message,
            line: token.line,
        }
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    // discard tokens until a statement boundary so one malformed statement
    // produces one error, not a cascade
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SemiColon {
                return;
            }

            match self.peek().token_type {
                TokenType::Let | TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    fn parse(source: &str) -> Program {
        let mut scanner = Scanner::new(source.to_string());
        let tokens = scanner.scan_tokens().clone();
        Parser::new(tokens).parse()
    }

    fn parse_clean(source: &str) -> Program {
        let program = parse(source);
        assert!(
            program.errors.is_empty(),
            "unexpected parse errors: {:?}",
            program.errors
        );
        program
    }

    fn single_expression(source: &str) -> Expression {
        let mut program = parse_clean(source);
        assert_eq!(program.statements.len(), 1);
        match program.statements.remove(0) {
            Statement::Expression(expression) => expression,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    #[test]
    fn let_statements_bind_name_and_value() {
        let program = parse_clean("let x = 5; let y = true; let foobar = y;");
        assert_eq!(
            program.statements,
            vec![
                Statement::Let {
                    name: "x".to_string(),
                    value: Expression::IntegerLiteral(5),
                },
                Statement::Let {
                    name: "y".to_string(),
                    value: Expression::BooleanLiteral(true),
                },
                Statement::Let {
                    name: "foobar".to_string(),
                    value: Expression::Identifier("y".to_string()),
                },
            ]
        );
    }

    #[test]
    fn return_statements_carry_their_value() {
        let program = parse_clean("return 5; return foobar;");
        assert_eq!(
            program.statements,
            vec![
                Statement::Return(Expression::IntegerLiteral(5)),
                Statement::Return(Expression::Identifier("foobar".to_string())),
            ]
        );
    }

    #[test]
    fn literal_expressions() {
        assert_eq!(single_expression("5;"), Expression::IntegerLiteral(5));
        assert_eq!(
            single_expression("\"hello world\";"),
            Expression::StringLiteral("hello world".to_string())
        );
        assert_eq!(single_expression("true;"), Expression::BooleanLiteral(true));
        assert_eq!(
            single_expression("foobar;"),
            Expression::Identifier("foobar".to_string())
        );
    }

    #[test]
    fn prefix_expressions() {
        let cases = [
            ("!5;", TokenType::Bang, Expression::IntegerLiteral(5)),
            ("-15;", TokenType::Minus, Expression::IntegerLiteral(15)),
            ("!true;", TokenType::Bang, Expression::BooleanLiteral(true)),
        ];
        for (source, operator, right) in cases {
            assert_eq!(
                single_expression(source),
                Expression::Prefix {
                    operator,
                    right: Box::new(right),
                }
            );
        }
    }

    #[test]
    fn infix_expressions() {
        let operators = [
            ("5 + 5;", TokenType::Plus),
            ("5 - 5;", TokenType::Minus),
            ("5 * 5;", TokenType::Star),
            ("5 / 5;", TokenType::Slash),
            ("5 < 5;", TokenType::Less),
            ("5 > 5;", TokenType::Greater),
            ("5 == 5;", TokenType::EqualEqual),
            ("5 != 5;", TokenType::BangEqual),
        ];
        for (source, operator) in operators {
            assert_eq!(
                single_expression(source),
                Expression::Infix {
                    operator,
                    left: Box::new(Expression::IntegerLiteral(5)),
                    right: Box::new(Expression::IntegerLiteral(5)),
                }
            );
        }
    }

    #[test]
    fn operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b / c", "(a + (b / c))"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4; -5 * 5", "(3 + 4)\n((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
            ),
            ("3 > 5 == false", "((3 > 5) == false)"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("2 / (5 + 5)", "(2 / (5 + 5))"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
            ),
            ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
            (
                "a * [1, 2, 3, 4][b * c] * d",
                "((a * ([1, 2, 3, 4][(b * c)])) * d)",
            ),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))",
            ),
        ];
        for (source, expected) in cases {
            assert_eq!(parse_clean(source).to_string(), expected, "input: {}", source);
        }
    }

    #[test]
    fn equal_precedence_folds_to_the_left() {
        assert_eq!(parse_clean("10 - 3 - 2").to_string(), "((10 - 3) - 2)");
    }

    #[test]
    fn if_expression_without_alternative() {
        let expression = single_expression("if (x < y) { x }");
        match expression {
            Expression::IfElse {
                condition,
                consequence,
                alternative,
            } => {
                assert_eq!(condition.to_string(), "(x < y)");
                assert_eq!(consequence.statements.len(), 1);
                assert!(alternative.is_none());
            }
            other => panic!("expected an if expression, got {:?}", other),
        }
    }

    #[test]
    fn if_expression_with_alternative() {
        let expression = single_expression("if (x < y) { x } else { y }");
        match expression {
            Expression::IfElse { alternative, .. } => {
                let alternative = alternative.expect("alternative block");
                assert_eq!(alternative.statements.len(), 1);
            }
            other => panic!("expected an if expression, got {:?}", other),
        }
    }

    #[test]
    fn function_literal_parameters() {
        let cases = [
            ("fn() {};", vec![]),
            ("fn(x) {};", vec!["x"]),
            ("fn(x, y, z) {};", vec!["x", "y", "z"]),
        ];
        for (source, expected) in cases {
            match single_expression(source) {
                Expression::FunctionLiteral { parameters, .. } => {
                    assert_eq!(parameters, expected);
                }
                other => panic!("expected a function literal, got {:?}", other),
            }
        }
    }

    #[test]
    fn call_expression_arguments() {
        let expression = single_expression("add(1, 2 * 3, 4 + 5);");
        match expression {
            Expression::Call { callee, arguments } => {
                assert_eq!(callee.to_string(), "add");
                let printed: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                assert_eq!(printed, vec!["1", "(2 * 3)", "(4 + 5)"]);
            }
            other => panic!("expected a call expression, got {:?}", other),
        }
    }

    #[test]
    fn array_literal_and_index() {
        assert_eq!(
            single_expression("[1, 2 * 2, 3 + 3]").to_string(),
            "[1, (2 * 2), (3 + 3)]"
        );
        assert_eq!(
            single_expression("myArray[1 + 1]").to_string(),
            "(myArray[(1 + 1)])"
        );
        assert_eq!(single_expression("[]").to_string(), "[]");
    }

    #[test]
    fn missing_prefix_rule_is_reported() {
        let program = parse("+ 5;");
        assert_eq!(program.errors.len(), 1);
        assert!(
            program.errors[0]
                .message
                .contains("no prefix parse function for '+'"),
            "got: {}",
            program.errors[0].message
        );
    }

    #[test]
    fn expected_token_error_names_both_tokens() {
        let program = parse("let 5 = 6;");
        assert!(!program.errors.is_empty());
        assert!(
            program.errors[0]
                .message
                .contains("expected token 'identifier' but found 'number'"),
            "got: {}",
            program.errors[0].message
        );
    }

    #[test]
    fn unbalanced_closing_paren_is_an_error() {
        let program = parse("(1 + 2));");
        assert_eq!(program.errors.len(), 1);
        assert!(
            program.errors[0]
                .message
                .contains("no prefix parse function for ')'"),
            "got: {}",
            program.errors[0].message
        );
    }

    #[test]
    fn unterminated_group_is_an_error() {
        let program = parse("(1 + 2");
        assert_eq!(program.errors.len(), 1);
        assert!(
            program.errors[0]
                .message
                .contains("expected token ')' but found 'end of file'"),
            "got: {}",
            program.errors[0].message
        );
    }

    #[test]
    fn oversized_integer_literal_is_an_error() {
        let program = parse("92233720368547758078;");
        assert_eq!(program.errors.len(), 1);
        assert!(program.errors[0].message.contains("as an integer"));
    }

    #[test]
    fn parser_recovers_at_the_next_statement_boundary() {
        let program = parse("let = 5; let y = 10; y;");
        assert_eq!(program.errors.len(), 1);
        assert_eq!(program.statements.len(), 2);
        assert_eq!(
            program.statements[0],
            Statement::Let {
                name: "y".to_string(),
                value: Expression::IntegerLiteral(10),
            }
        );
    }

    #[test]
    fn illegal_token_is_reported_with_its_line() {
        let program = parse("1 + 2;\n@;");
        assert_eq!(program.errors.len(), 1);
        assert_eq!(program.errors[0].line, 2);
    }
}
