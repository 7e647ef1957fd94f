use crate::*;
use parking_lot::RwLock;
use std::{collections::HashMap, thread, time::Duration};
use strata_ir::{
    Binding, Block, CallKind, EntryPoint, Identifier, Instruction, Signature, Status, Symbol,
    Variable, Varargs, VariableId,
};

#[derive(Clone)]
struct TestModule {
    name: Arc<str>,
    chains: Arc<RwLock<HashMap<String, Vec<Arc<Symbol>>>>>,
}

impl Module for TestModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidates(&self, function: &str) -> Vec<Arc<Symbol>> {
        self.chains.read().get(function).cloned().unwrap_or_default()
    }

    fn insert_specialization(&self, generic: &Symbol, specialization: Symbol) -> Arc<Symbol> {
        let mut chains = self.chains.write();
        let chain = chains
            .entry(generic.signature.name.to_string())
            .or_default();

        if let Some(existing) = chain.iter().find(|symbol| {
            symbol.specialization_of == Some(generic.id)
                && symbol.signature.formals == specialization.signature.formals
        }) {
            return existing.clone();
        }

        let position = chain
            .iter()
            .position(|symbol| symbol.id == generic.id)
            .unwrap_or(0);

        let specialization = Arc::new(specialization);
        chain.insert(position, specialization.clone());
        specialization
    }
}

struct TestDriver {
    modules: HashMap<String, TestModule>,
    recursion_limit: u32,
}

impl Driver for TestDriver {
    type Module = TestModule;

    fn find_module(&self, name: &str) -> Option<Self::Module> {
        self.modules.get(name).cloned()
    }

    fn recursion_limit(&self) -> u32 {
        self.recursion_limit
    }
}

impl TestDriver {
    fn new() -> Self {
        TestDriver {
            modules: HashMap::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    fn define(&mut self, symbol: Symbol) -> Arc<Symbol> {
        let module = symbol.signature.module.clone();
        let module = self
            .modules
            .entry(module.to_string())
            .or_insert_with(|| TestModule {
                name: module,
                chains: Default::default(),
            });

        let symbol = Arc::new(symbol);
        module
            .chains
            .write()
            .entry(symbol.signature.name.to_string())
            .or_default()
            .insert(0, symbol.clone());

        symbol
    }

    fn chain(&self, module: &str, function: &str) -> Vec<Arc<Symbol>> {
        self.modules[module].candidates(function)
    }
}

fn r#type(text: &str) -> Type {
    text.parse().unwrap()
}

fn signature(kind: CallKind, path: &str, returns: &[&str], arguments: &[&str]) -> Signature {
    let (module, name) = path.split_once('.').unwrap();

    Signature {
        module: Arc::from(module),
        name: Arc::from(name),
        kind,
        formals: returns.iter().chain(arguments).map(|text| r#type(text)).collect(),
        retc: returns.len(),
        varargs: Varargs::default(),
        entry: None,
    }
}

fn command(path: &str, returns: &[&str], arguments: &[&str]) -> Symbol {
    let mut signature = signature(CallKind::Command, path, returns, arguments);
    signature.entry = Some(EntryPoint(Arc::from(format!("CMD{}", signature.name))));
    Symbol::native(signature)
}

fn variadic_pattern(path: &str, returns: &[&str], arguments: &[&str]) -> Symbol {
    let mut signature = signature(CallKind::Pattern, path, returns, arguments);
    signature.varargs.arguments = true;
    Symbol::native(signature)
}

/// `function user.identity(v:any_1):any_1; result := v; end identity;`
fn identity() -> Symbol {
    let signature = signature(CallKind::Function, "user.identity", &["any_1"], &["any_1"]);

    let mut body = Block::new("identity");
    let result = body.add_variable(Variable::typed("result", r#type("any_1")));
    let v = body.add_variable(Variable::typed("v", r#type("any_1")));
    body.parameters = vec![result, v];
    body.retc = 1;
    body.polymorphic = signature.polymorphic();
    body.push(Instruction::assign([result], [v]));

    Symbol::function(signature, body)
}

fn variable(block: &mut Block, name: &str, declared: Option<&str>) -> VariableId {
    block.add_variable(match declared {
        Some(declared) => Variable::typed(name, r#type(declared)),
        None => Variable::new(name),
    })
}

#[test]
fn resolves_native_command() {
    let mut driver = TestDriver::new();
    let plus = driver.define(command("calc.plus", &["int"], &["int", "int"]));

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let y = variable(&mut block, "y", Some("int"));
    let z = variable(&mut block, "z", None);
    block.push(Instruction::call("calc", "plus", [z], [x, y]));

    let report = resolve_block(&driver, &mut block, false);

    assert_eq!(report.resolved, 1);
    assert!(!report.is_erroneous());
    assert_eq!(block.type_of(z), &r#type("int"));
    assert!(block.variable(z).fixed);
    assert!(matches!(
        block.instructions[0].binding,
        Some(Binding::NativeCommand { symbol, .. }) if symbol == plus.id
    ));
}

#[test]
fn specializes_polymorphic_function() {
    let mut driver = TestDriver::new();
    let generic = driver.define(identity());

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("bat[:oid,:str]"));
    let y = variable(&mut block, "y", None);
    block.push(Instruction::call("user", "identity", [y], [x]));

    let report = resolve_block(&driver, &mut block, false);
    assert_eq!(report.resolved, 1);
    assert!(report.diagnostics.is_empty());

    assert_eq!(block.type_of(y), &r#type("bat[:oid,:str]"));
    assert!(block.variable(y).cleanup);
    assert!(block.gc);

    let chain = driver.chain("user", "identity");
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].specialization_of, Some(generic.id));
    assert_eq!(chain[1].id, generic.id);
    assert_eq!(chain[0].signature.polymorphic(), 0);
    assert!(!chain[0].has_errors());

    match &block.instructions[0].binding {
        Some(Binding::UserFunction(symbol)) => assert_eq!(symbol.id, chain[0].id),
        other => panic!("expected a user function, found {other:?}"),
    }

    let body = chain[0].body.as_ref().unwrap().lock();
    assert!(body.instructions[0].is_resolved());
    assert_eq!(body.type_of(body.parameters[0]), &r#type("bat[:oid,:str]"));
}

#[test]
fn each_concrete_instance_gets_its_own_specialization() {
    let mut driver = TestDriver::new();
    driver.define(identity());

    let mut block = Block::new("main");
    let strings = variable(&mut block, "strings", Some("bat[:oid,:str]"));
    let integers = variable(&mut block, "integers", Some("bat[:oid,:int]"));
    let a = variable(&mut block, "a", None);
    let b = variable(&mut block, "b", None);
    let c = variable(&mut block, "c", None);
    block.push(Instruction::call("user", "identity", [a], [strings]));
    block.push(Instruction::call("user", "identity", [b], [integers]));
    block.push(Instruction::call("user", "identity", [c], [strings]));

    let report = resolve_block(&driver, &mut block, false);
    assert_eq!(report.resolved, 3);

    let chain = driver.chain("user", "identity");
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[0].signature.formals[1], r#type("bat[:oid,:str]"));
    assert_eq!(chain[1].signature.formals[1], r#type("bat[:oid,:int]"));

    assert_eq!(block.type_of(b), &r#type("bat[:oid,:int]"));

    let callee = |pc: usize| block.instructions[pc].binding.as_ref().and_then(Binding::symbol);
    assert_eq!(callee(0), callee(2));
    assert_ne!(callee(0), callee(1));
}

#[test]
fn undefined_function_is_reported() {
    let mut driver = TestDriver::new();
    driver.define(command("calc.plus", &["int"], &["int", "int"]));

    let mut block = Block::new("main");
    let a = variable(&mut block, "a", Some("int"));
    let r = variable(&mut block, "r", None);
    block.push(Instruction::call("calc", "foo", [r], [a]));

    let report = resolve_block(&driver, &mut block, false);

    assert!(report.is_erroneous());
    assert!(block.is_erroneous());
    assert_eq!(block.instructions[0].status, Status::Unresolved);
    assert_eq!(
        report.diagnostics,
        vec![WithInfo::new(
            Info {
                function: String::from("main"),
                pc: 0,
            },
            Diagnostic::UndefinedFunction {
                module: String::from("calc"),
                function: String::from("foo"),
                arguments: vec![r#type("int")],
            },
        )]
    );
}

#[test]
fn silent_probe_leaves_error_count_alone() {
    let driver = TestDriver::new();

    let mut block = Block::new("main");
    let a = variable(&mut block, "a", Some("int"));
    let r = variable(&mut block, "r", None);
    block.push(Instruction::call("calc", "foo", [r], [a]));

    let report = resolve_block(&driver, &mut block, true);

    assert_eq!(report.unresolved, 1);
    assert!(!report.is_erroneous());
    assert!(report.diagnostics.is_empty());
    assert_eq!(block.errors, 0);
}

#[test]
fn nil_takes_destination_type() {
    let driver = TestDriver::new();

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("str"));
    let nil = block.add_constant(strata_ir::Value::Nil);
    block.push(Instruction::assign([x], [nil]));

    let report = resolve_block(&driver, &mut block, false);
    assert_eq!(report.resolved, 1);

    let source = block.instructions[0].sources()[0];
    assert_ne!(source, nil);
    assert_eq!(block.type_of(source), &r#type("str"));
    assert_eq!(block.variable(source).value, Some(strata_ir::Value::Nil));
    assert_eq!(block.type_of(x), &r#type("str"));
}

#[test]
fn nil_for_container_becomes_bare_container() {
    let driver = TestDriver::new();

    let mut block = Block::new("main");
    let b = variable(&mut block, "b", Some("bat[:oid,:int]"));
    let nil = block.add_constant(strata_ir::Value::Nil);
    block.push(Instruction::assign([b], [nil]));

    resolve_block(&driver, &mut block, false);

    let source = block.instructions[0].sources()[0];
    assert_eq!(block.type_of(source), &Type::Bat);
}

#[test]
fn variable_module_is_deferred() {
    let driver = TestDriver::new();

    let mut block = Block::new("main");
    let m = variable(&mut block, "m", Some("str"));
    let x = variable(&mut block, "x", Some("int"));
    let r = variable(&mut block, "r", None);
    block.push(Instruction::call(
        Identifier::Variable(m),
        "plus",
        [r],
        [x, x],
    ));

    let report = resolve_block(&driver, &mut block, true);

    assert_eq!(report.deferred, 1);
    assert!(report.diagnostics.is_empty());
    assert!(!block.is_erroneous());
    assert_eq!(block.instructions[0].status, Status::Dynamic);
}

#[test]
fn second_pass_is_a_no_op() {
    let mut driver = TestDriver::new();
    driver.define(command("calc.plus", &["int"], &["int", "int"]));
    driver.define(identity());

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let z = variable(&mut block, "z", None);
    let w = variable(&mut block, "w", None);
    block.push(Instruction::call("calc", "plus", [z], [x, x]));
    block.push(Instruction::call("user", "identity", [w], [z]));

    let first = resolve_block(&driver, &mut block, false);
    let types = block.variables.clone();
    let chain = driver.chain("user", "identity").len();

    let second = resolve_block(&driver, &mut block, false);

    assert_eq!(first, second);
    assert_eq!(block.variables, types);
    assert_eq!(driver.chain("user", "identity").len(), chain);
}

#[test]
fn constant_destination_is_fatal() {
    let mut driver = TestDriver::new();
    driver.define(command("calc.plus", &["int"], &["int", "int"]));
    driver.define(command("calc.plus", &["str"], &["int", "int"]));

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let constant = block.add_constant(strata_ir::Value::Str(String::from("a")));
    block.push(Instruction::call("calc", "plus", [constant], [x, x]));

    let report = resolve_block(&driver, &mut block, false);

    assert_eq!(report.errors, 1);
    assert!(matches!(
        report.diagnostics[0].item,
        Diagnostic::ConstantAssignment(_)
    ));
}

#[test]
fn missing_entry_point_is_reported() {
    let mut driver = TestDriver::new();
    driver.define(Symbol::native(signature(
        CallKind::Command,
        "calc.neg",
        &["int"],
        &["int"],
    )));

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let r = variable(&mut block, "r", None);
    block.push(Instruction::call("calc", "neg", [r], [x]));

    let report = resolve_block(&driver, &mut block, false);

    assert_eq!(
        report.diagnostics[0].item,
        Diagnostic::MissingImplementation {
            module: String::from("calc"),
            function: String::from("neg"),
        }
    );
    assert_eq!(block.instructions[0].status, Status::Unresolved);
}

#[test]
fn erroneous_function_cannot_be_bound() {
    let mut driver = TestDriver::new();
    let broken = driver.define(Symbol::function(
        signature(CallKind::Function, "user.broken", &["int"], &["int"]),
        Block::new("broken"),
    ));
    broken.set_errors(true);

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let r = variable(&mut block, "r", None);
    block.push(Instruction::call("user", "broken", [r], [x]));

    let report = resolve_block(&driver, &mut block, false);

    assert!(matches!(
        report.diagnostics[0].item,
        Diagnostic::ErroneousFunction { .. }
    ));
}

#[test]
fn multiple_assignment_must_pair_up() {
    let driver = TestDriver::new();

    let mut block = Block::new("main");
    let a = variable(&mut block, "a", Some("int"));
    let b = variable(&mut block, "b", Some("int"));
    let c = variable(&mut block, "c", Some("int"));
    block.push(Instruction::assign([a, b], [b, a]));
    block.push(Instruction::assign([a, b], [a, b, c]));

    let report = resolve_block(&driver, &mut block, false);

    assert_eq!(report.resolved, 1);
    assert_eq!(report.unresolved, 1);
    assert_eq!(
        report.diagnostics[0].item,
        Diagnostic::MultipleAssignmentMismatch {
            returns: 2,
            sources: 3,
        }
    );
}

#[test]
fn assignment_mismatch_is_reported() {
    let driver = TestDriver::new();

    let mut block = Block::new("main");
    let a = variable(&mut block, "a", Some("int"));
    let s = variable(&mut block, "s", Some("str"));
    block.push(Instruction::assign([a], [s]));

    let report = resolve_block(&driver, &mut block, false);

    assert_eq!(
        report.diagnostics[0].item,
        Diagnostic::TypeMismatch {
            destination: r#type("int"),
            source: r#type("str"),
        }
    );
}

#[test]
fn variadic_patterns_take_any_number_of_arguments() {
    let mut driver = TestDriver::new();
    driver.define(variadic_pattern("io.print", &["void"], &["any"]));
    driver.define(variadic_pattern("sql.concat", &["any_1"], &["any_1"]));

    let mut block = Block::new("main");
    let i = variable(&mut block, "i", Some("int"));
    let s = variable(&mut block, "s", Some("str"));
    let b = variable(&mut block, "b", Some("bat[:oid,:int]"));
    let v = variable(&mut block, "v", None);
    let w = variable(&mut block, "w", None);
    let x = variable(&mut block, "x", None);
    let y = variable(&mut block, "y", None);
    block.push(Instruction::call("io", "print", [v], [i, s, b]));
    block.push(Instruction::call("sql", "concat", [w], [i, i, i]));
    block.push(Instruction::call("sql", "concat", [x], [i, s]));
    block.push(Instruction::call("io", "print", [y], []));

    let report = resolve_block(&driver, &mut block, true);

    assert_eq!(block.instructions[0].status, Status::Resolved);
    assert!(block.instructions[0].varargs.arguments);
    assert_eq!(block.type_of(w), &r#type("int"));
    assert_eq!(block.instructions[2].status, Status::Unresolved);
    assert_eq!(block.instructions[3].status, Status::Unresolved);
    assert_eq!(report.resolved, 2);
}

#[test]
fn variadic_returns_repeat_the_last_formal() {
    let mut driver = TestDriver::new();
    let mut many = command("calc.many", &["int"], &["int"]);
    many.signature.varargs.returns = true;
    driver.define(many);

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let c = variable(&mut block, "c", None);
    let d = variable(&mut block, "d", None);
    let e = variable(&mut block, "e", None);
    let s = variable(&mut block, "s", Some("str"));
    block.push(Instruction::call("calc", "many", [c, d, e], [x]));
    block.push(Instruction::call("calc", "many", [c, s], [x]));

    let report = resolve_block(&driver, &mut block, true);

    assert_eq!(block.instructions[0].status, Status::Resolved);
    assert!(block.instructions[0].varargs.returns);
    for destination in [c, d, e] {
        assert_eq!(block.type_of(destination), &r#type("int"));
    }

    // Every repeated return takes the same formal
    assert_eq!(block.instructions[1].status, Status::Unresolved);
    assert_eq!(report.resolved, 1);
}

#[test]
fn unknown_arguments_skip_bound_generic_peers() {
    let mut driver = TestDriver::new();
    driver.define(command("calc.same", &["str"], &["int", "any"]));
    driver.define(command("calc.same", &["int"], &["any_1", "any_1"]));

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let y = variable(&mut block, "y", None);
    let z = variable(&mut block, "z", Some("int"));
    let r = variable(&mut block, "r", None);
    let t = variable(&mut block, "t", None);
    block.push(Instruction::call("calc", "same", [r], [x, y]));
    block.push(Instruction::call("calc", "same", [t], [x, z]));

    let report = resolve_block(&driver, &mut block, false);

    assert_eq!(report.resolved, 2);
    assert_eq!(block.type_of(r), &r#type("str"));
    assert_eq!(block.type_of(t), &r#type("int"));
}

#[test]
fn unknown_arguments_do_not_specialize() {
    let mut driver = TestDriver::new();

    let mut body = Block::new("pair");
    let result = variable(&mut body, "result", Some("any_1"));
    let a = variable(&mut body, "a", Some("any_1"));
    let b = variable(&mut body, "b", Some("any_1"));
    body.parameters = vec![result, a, b];
    body.retc = 1;
    body.polymorphic = 1;
    body.push(Instruction::assign([result], [a]));

    driver.define(Symbol::function(
        signature(CallKind::Function, "user.pair", &["any_1"], &["any_1", "any_1"]),
        body,
    ));

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let y = variable(&mut block, "y", None);
    let r = variable(&mut block, "r", None);
    block.push(Instruction::call("user", "pair", [r], [x, y]));

    let report = resolve_block(&driver, &mut block, false);

    assert!(report.is_erroneous());
    assert!(matches!(
        report.diagnostics[0].item,
        Diagnostic::UndefinedFunction { .. }
    ));
    assert_eq!(driver.chain("user", "pair").len(), 1);
}

#[test]
fn bindings_wait_for_specializations_in_progress() {
    let mut driver = TestDriver::new();
    let generic = driver.define(identity());

    let specialization = driver.modules["user"].insert_specialization(
        &generic,
        Symbol::specialization(
            &generic,
            signature(CallKind::Function, "user.identity", &["int"], &["int"]),
            Block::new("identity"),
        ),
    );
    assert!(specialization.is_resolving());

    // Another thread is resolving the body
    let body = specialization.body.as_ref().unwrap().lock();

    thread::scope(|scope| {
        let caller = scope.spawn(|| {
            let mut block = Block::new("main");
            let x = variable(&mut block, "x", Some("int"));
            let y = variable(&mut block, "y", None);
            block.push(Instruction::call("user", "identity", [y], [x]));

            let report = resolve_block(&driver, &mut block, false);
            (block.instructions[0].status, report)
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!caller.is_finished());

        specialization.finish_resolving(true);
        drop(body);

        let (status, report) = caller.join().unwrap();
        assert_eq!(status, Status::Unresolved);
        assert!(matches!(
            report.diagnostics[0].item,
            Diagnostic::ErroneousFunction { .. }
        ));
    });

    assert!(!specialization.is_resolving());
}

#[test]
fn recursive_calls_bind_to_the_specialization_in_progress() {
    let mut driver = TestDriver::new();

    // `function user.loop(v:any_1):any_1; result := user.loop(v); end loop;`
    let mut body = Block::new("loop");
    let result = variable(&mut body, "result", Some("any_1"));
    let v = variable(&mut body, "v", Some("any_1"));
    body.parameters = vec![result, v];
    body.retc = 1;
    body.polymorphic = 1;
    body.push(Instruction::call("user", "loop", [result], [v]));

    driver.define(Symbol::function(
        signature(CallKind::Function, "user.loop", &["any_1"], &["any_1"]),
        body,
    ));

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let y = variable(&mut block, "y", None);
    block.push(Instruction::call("user", "loop", [y], [x]));

    let report = resolve_block(&driver, &mut block, false);

    assert!(!report.is_erroneous());

    let chain = driver.chain("user", "loop");
    assert_eq!(chain.len(), 2);
    assert!(!chain[0].is_resolving());

    let body = chain[0].body.as_ref().unwrap().lock();
    match &body.instructions[0].binding {
        Some(Binding::UserFunction(symbol)) => assert_eq!(symbol.id, chain[0].id),
        other => panic!("expected a user function, found {other:?}"),
    }
}

#[test]
fn generic_bodies_defer_failed_calls() {
    let mut driver = TestDriver::new();
    driver.define(command("calc.plus", &["int"], &["int", "int"]));

    let mut body = Block::new("twice");
    let result = variable(&mut body, "result", Some("any_1"));
    let v = variable(&mut body, "v", Some("any_1"));
    body.parameters = vec![result, v];
    body.retc = 1;
    body.polymorphic = 1;
    body.push(Instruction::call("calc", "plus", [result], [v, v]));

    prepare_signature(&mut body);
    let report = resolve_block(&driver, &mut body, false);

    assert_eq!(report.deferred, 1);
    assert!(!report.is_erroneous());
    assert!(report.diagnostics.is_empty());
}

#[test]
fn specializations_resolve_the_body_again() {
    let mut driver = TestDriver::new();
    driver.define(command("calc.plus", &["int"], &["int", "int"]));

    let mut body = Block::new("twice");
    let result = variable(&mut body, "result", Some("any_1"));
    let v = variable(&mut body, "v", Some("any_1"));
    body.parameters = vec![result, v];
    body.retc = 1;
    body.polymorphic = 1;
    body.push(Instruction::call("calc", "plus", [result], [v, v]));

    driver.define(Symbol::function(
        signature(CallKind::Function, "user.twice", &["any_1"], &["any_1"]),
        body,
    ));

    let mut block = Block::new("main");
    let i = variable(&mut block, "i", Some("int"));
    let s = variable(&mut block, "s", Some("str"));
    let a = variable(&mut block, "a", None);
    let b = variable(&mut block, "b", None);
    block.push(Instruction::call("user", "twice", [a], [i]));
    block.push(Instruction::call("user", "twice", [b], [s]));

    let report = resolve_block(&driver, &mut block, false);

    assert_eq!(block.instructions[0].status, Status::Resolved);
    assert_eq!(block.type_of(a), &r#type("int"));

    // The `str` specialization can't add strings
    assert_eq!(block.instructions[1].status, Status::Unresolved);
    let functions = report
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.info.function.as_str())
        .collect::<Vec<_>>();
    assert_eq!(functions, ["twice", "main"]);
    assert!(matches!(
        report.diagnostics[1].item,
        Diagnostic::ErroneousFunction { .. }
    ));
}

#[test]
fn recursion_limit_stops_specialization() {
    let mut driver = TestDriver::new();
    driver.recursion_limit = 0;
    driver.define(identity());

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let y = variable(&mut block, "y", None);
    block.push(Instruction::call("user", "identity", [y], [x]));

    let report = resolve_block(&driver, &mut block, false);

    assert_eq!(
        report.diagnostics[0].item,
        Diagnostic::RecursiveSpecialization {
            module: String::from("user"),
            function: String::from("identity"),
        }
    );
    assert_eq!(driver.chain("user", "identity").len(), 1);
}

#[test]
fn invalidated_instructions_are_checked_again() {
    let mut driver = TestDriver::new();
    driver.define(command("calc.plus", &["int"], &["int", "int"]));
    driver.define(command("calc.plus", &["lng"], &["lng", "lng"]));

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", Some("int"));
    let l = variable(&mut block, "l", Some("lng"));
    let z = variable(&mut block, "z", None);
    let w = variable(&mut block, "w", None);
    block.push(Instruction::call("calc", "plus", [z], [x, x]));

    resolve_block(&driver, &mut block, false);
    let before = block.instructions[0].binding.as_ref().and_then(Binding::symbol);

    // Rewrite the instruction the way an optimizer would
    block.instructions[0].arguments = vec![w, l, l];
    block.instructions[0].invalidate();

    let report = resolve_block(&driver, &mut block, false);
    let after = block.instructions[0].binding.as_ref().and_then(Binding::symbol);

    assert_eq!(report.resolved, 1);
    assert_ne!(before, after);
    assert_eq!(block.type_of(w), &r#type("lng"));

    let forced = resolve_instruction(&driver, &mut block, 0, false);
    assert_eq!(forced.resolved, 1);
    assert_eq!(
        block.instructions[0].binding.as_ref().and_then(Binding::symbol),
        after
    );
}

#[test]
fn binder_skips_type_checks() {
    let mut driver = TestDriver::new();
    driver.define(command("calc.plus", &["int"], &["int", "int"]));

    let mut block = Block::new("main");
    let x = variable(&mut block, "x", None);
    let z = variable(&mut block, "z", None);
    block.push(Instruction::call("calc", "plus", [z], [x, x]));
    block.push(Instruction::call("calc", "plus", [z], [x]));

    let report = bind_function(&driver, &mut block);

    assert_eq!(report.resolved, 1);
    assert_eq!(report.unresolved, 1);
    assert_eq!(block.type_of(z), &Type::Any);
}

#[test]
fn diagnostics_serialize_like_the_rest_of_the_compiler() {
    let diagnostic = Diagnostic::ConstantAssignment(String::from("x"));

    assert_eq!(
        serde_json::to_value(&diagnostic).unwrap(),
        serde_json::json!({ "type": "constantAssignment", "value": "x" })
    );
}
