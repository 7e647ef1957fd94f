//! Recursive descent over the tokens of a listing.

use crate::{
    ast::{Callee, Definition, Listing, Operand, Parameter, Source, Statement, Target},
    tokenize::{tokenize, Keyword, Token},
    Error, Span,
};
use strata_ir::{Barrier, CallKind, Type, Value, Varargs};
use strata_util::WithInfo;

/// Parse a complete listing. Parsing stops at the first error.
pub fn parse(s: &str) -> Result<Listing, Error> {
    let tokens = tokenize(s)?;

    Parser {
        tokens,
        position: 0,
        end: s.len(),
    }
    .listing()
}

struct Parser<'src> {
    tokens: Vec<WithInfo<Span, Token<'src>>>,
    position: usize,
    end: usize,
}

// MARK: Cursor

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<&Token<'src>> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token<'src>> {
        self.tokens.get(self.position + n).map(|token| &token.item)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(self.end, |token| token.info.start)
    }

    fn previous_end(&self) -> usize {
        self.position
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map_or(0, |token| token.info.end)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn eat(&mut self, token: &Token<'src>) -> bool {
        let found = self.peek() == Some(token);
        if found {
            self.advance();
        }

        found
    }

    fn expect(&mut self, token: &Token<'src>, expected: &'static str) -> Result<(), Error> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.expected(expected))
        }
    }

    fn expected(&self, expected: &'static str) -> Error {
        Error::Expected {
            expected,
            offset: self.offset(),
        }
    }

    fn name(&mut self, expected: &'static str) -> Result<&'src str, Error> {
        match self.peek() {
            Some(&Token::Name(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.expected(expected)),
        }
    }
}

// MARK: Definitions

impl<'src> Parser<'src> {
    fn listing(mut self) -> Result<Listing, Error> {
        let mut listing = Listing {
            definitions: Vec::new(),
            statements: Vec::new(),
        };

        while let Some(token) = self.peek() {
            let kind = match token {
                Token::Keyword(Keyword::Command) => Some(CallKind::Command),
                Token::Keyword(Keyword::Pattern) => Some(CallKind::Pattern),
                Token::Keyword(Keyword::Factory) => Some(CallKind::Factory),
                Token::Keyword(Keyword::Function) => Some(CallKind::Function),
                _ => None,
            };

            match kind {
                Some(kind) => {
                    let start = self.offset();
                    self.advance();
                    let definition = self.definition(kind, start)?;
                    listing
                        .definitions
                        .push(WithInfo::new(start..self.previous_end(), definition));
                }
                None => listing.statements.push(self.statement()?),
            }
        }

        Ok(listing)
    }

    fn definition(&mut self, kind: CallKind, start: usize) -> Result<Definition, Error> {
        let module = self.name("a module name")?.to_string();
        self.expect(&Token::Dot, "`.`")?;
        let name = self.name("a function name")?.to_string();

        self.expect(&Token::LeftParenthesis, "`(`")?;
        let (parameters, variadic_arguments) = self.parameters()?;

        let (returns, variadic_returns) = if !self.eat(&Token::Colon) {
            (vec![result(Type::void())], false)
        } else if self.eat(&Token::LeftParenthesis) {
            self.parameters()?
        } else {
            let r#type = self.r#type()?;
            let variadic = self.eat(&Token::Ellipsis);
            (vec![result(r#type)], variadic)
        };

        if returns.is_empty() {
            return Err(Error::MissingReturns { offset: start });
        }

        let address = if self.eat(&Token::Keyword(Keyword::Address)) {
            Some(self.name("an address")?.to_string())
        } else {
            None
        };

        self.expect(&Token::Semicolon, "`;`")?;

        let body = if kind == CallKind::Function && address.is_none() {
            Some(self.body(&name, start)?)
        } else {
            None
        };

        Ok(Definition {
            kind,
            module,
            name,
            parameters,
            returns,
            varargs: Varargs {
                arguments: variadic_arguments,
                returns: variadic_returns,
            },
            address,
            body,
        })
    }

    /// Parses up to and including the closing parenthesis.
    fn parameters(&mut self) -> Result<(Vec<Parameter>, bool), Error> {
        let mut parameters = Vec::new();
        let mut variadic = false;

        if self.eat(&Token::RightParenthesis) {
            return Ok((parameters, variadic));
        }

        loop {
            if variadic {
                return Err(Error::VariadicNotLast {
                    offset: self.offset(),
                });
            }

            let name = self.name("a parameter name")?.to_string();
            self.expect(&Token::Colon, "`:`")?;
            let r#type = self.r#type()?;
            variadic = self.eat(&Token::Ellipsis);

            parameters.push(Parameter { name, r#type });

            if self.eat(&Token::RightParenthesis) {
                return Ok((parameters, variadic));
            }

            self.expect(&Token::Comma, "`,` or `)`")?;
        }
    }

    fn body(&mut self, name: &str, start: usize) -> Result<Vec<WithInfo<Span, Statement>>, Error> {
        let mut statements = Vec::new();

        loop {
            match self.peek() {
                None => {
                    return Err(Error::UnterminatedFunction {
                        name: name.to_string(),
                        offset: start,
                    })
                }
                Some(Token::Keyword(Keyword::End)) => {
                    self.advance();

                    let offset = self.offset();
                    let found = self.name("a function name")?;
                    if found != name {
                        return Err(Error::MismatchedEnd {
                            expected: name.to_string(),
                            found: found.to_string(),
                            offset,
                        });
                    }

                    self.expect(&Token::Semicolon, "`;`")?;

                    return Ok(statements);
                }
                Some(_) => statements.push(self.statement()?),
            }
        }
    }

    fn r#type(&mut self) -> Result<Type, Error> {
        let offset = self.offset();
        let name = self.name("a type")?;

        let text = if name == "bat" && self.eat(&Token::LeftBracket) {
            self.expect(&Token::Colon, "`:`")?;
            let key = self.name("a type")?;
            self.expect(&Token::Comma, "`,`")?;
            self.expect(&Token::Colon, "`:`")?;
            let value = self.name("a type")?;
            self.expect(&Token::RightBracket, "`]`")?;

            format!("bat[:{key},:{value}]")
        } else {
            name.to_string()
        };

        text.parse()
            .map_err(|source| Error::InvalidType { offset, source })
    }
}

fn result(r#type: Type) -> Parameter {
    Parameter {
        name: String::from("result"),
        r#type,
    }
}

// MARK: Statements

impl<'src> Parser<'src> {
    fn statement(&mut self) -> Result<WithInfo<Span, Statement>, Error> {
        let start = self.offset();

        let barrier = match self.peek() {
            Some(Token::Keyword(Keyword::Barrier)) => Some(Barrier::Barrier),
            Some(Token::Keyword(Keyword::Catch)) => Some(Barrier::Catch),
            Some(Token::Keyword(Keyword::Exit)) => Some(Barrier::Exit),
            Some(Token::Keyword(Keyword::Leave)) => Some(Barrier::Leave),
            Some(Token::Keyword(Keyword::Redo)) => Some(Barrier::Redo),
            Some(Token::Keyword(Keyword::Raise)) => Some(Barrier::Raise),
            _ => None,
        };

        if barrier.is_some() {
            self.advance();
        }

        let (targets, source) = if self.at_call() {
            (Vec::new(), self.call()?)
        } else {
            let targets = self.targets()?;
            let source = if self.eat(&Token::Assign) {
                self.source()?
            } else {
                Source::None
            };

            (targets, source)
        };

        self.expect(&Token::Semicolon, "`;`")?;

        Ok(WithInfo::new(
            start..self.previous_end(),
            Statement {
                barrier,
                targets,
                source,
            },
        ))
    }

    fn at_call(&self) -> bool {
        matches!(
            (self.peek(), self.peek_nth(1)),
            (Some(Token::Dollar), _) | (Some(Token::Name(_)), Some(Token::Dot))
        )
    }

    fn targets(&mut self) -> Result<Vec<Target>, Error> {
        if !self.eat(&Token::LeftParenthesis) {
            return Ok(vec![self.target("a statement")?]);
        }

        let mut targets = Vec::new();
        loop {
            targets.push(self.target("a variable name")?);

            if self.eat(&Token::RightParenthesis) {
                return Ok(targets);
            }

            self.expect(&Token::Comma, "`,` or `)`")?;
        }
    }

    fn target(&mut self, expected: &'static str) -> Result<Target, Error> {
        let name = self.name(expected)?.to_string();
        let r#type = if self.eat(&Token::Colon) {
            Some(self.r#type()?)
        } else {
            None
        };

        Ok(Target { name, r#type })
    }

    fn source(&mut self) -> Result<Source, Error> {
        if self.at_call() {
            return self.call();
        }

        if !self.eat(&Token::LeftParenthesis) {
            return Ok(Source::Operands(vec![self.operand()?]));
        }

        let mut operands = Vec::new();
        loop {
            operands.push(self.operand()?);

            if self.eat(&Token::RightParenthesis) {
                return Ok(Source::Operands(operands));
            }

            self.expect(&Token::Comma, "`,` or `)`")?;
        }
    }

    fn call(&mut self) -> Result<Source, Error> {
        let module = self.callee("a module name")?;
        self.expect(&Token::Dot, "`.`")?;
        let function = self.callee("a function name")?;
        self.expect(&Token::LeftParenthesis, "`(`")?;

        let mut arguments = Vec::new();
        if !self.eat(&Token::RightParenthesis) {
            loop {
                arguments.push(self.operand()?);

                if self.eat(&Token::RightParenthesis) {
                    break;
                }

                self.expect(&Token::Comma, "`,` or `)`")?;
            }
        }

        Ok(Source::Call {
            module,
            function,
            arguments,
        })
    }

    fn callee(&mut self, expected: &'static str) -> Result<Callee, Error> {
        if self.eat(&Token::Dollar) {
            Ok(Callee::Variable(self.name("a variable name")?.to_string()))
        } else {
            Ok(Callee::Name(self.name(expected)?.to_string()))
        }
    }

    fn operand(&mut self) -> Result<Operand, Error> {
        let value = match self.peek() {
            Some(Token::Name(_)) => return Ok(Operand::Variable(self.target("an operand")?)),
            Some(&Token::Number(number)) => Value::Int(number),
            Some(Token::Text(text)) => Value::Str(text.clone()),
            Some(Token::Keyword(Keyword::True)) => Value::Bit(true),
            Some(Token::Keyword(Keyword::False)) => Value::Bit(false),
            Some(Token::Keyword(Keyword::Nil)) => Value::Nil,
            _ => return Err(self.expected("an operand")),
        };

        self.advance();

        Ok(Operand::Literal(value))
    }
}
