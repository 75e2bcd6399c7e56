//! Pluggable execution backends

use std::cell::RefCell;
use std::rc::Rc;

use lusp_language::{
    Backend, Bytecode, Environment, Evaluator, Interpreter, InterpreterBackend,
    TracingInterpreter, Value, Vm, eval, eval_in,
};

const PROGRAM: &str = "
make = |n| { let x = n |() x = x + 1 x| }
let c = make(10)
let total = 0
let i = 0
while i < 4 { total = total + c() i = i + 1 }
total
";

/// Traces functions that take parameters and interprets everything else.
#[derive(Default)]
struct MixedBackend {
    chosen: RefCell<Vec<&'static str>>,
}

impl Backend for MixedBackend {
    fn select(&self, code: &Bytecode) -> Rc<dyn Evaluator> {
        let evaluator: Rc<dyn Evaluator> = if code.param_count() > 0 {
            Rc::new(TracingInterpreter)
        } else {
            Rc::new(Interpreter)
        };
        self.chosen.borrow_mut().push(evaluator.name());
        evaluator
    }
}

#[test]
fn every_backend_agrees() {
    let expected = eval(PROGRAM).unwrap();
    assert_eq!(expected, Value::Integer(11 + 12 + 13 + 14));

    let backends: Vec<Rc<dyn Backend>> = vec![
        Rc::new(InterpreterBackend::new()),
        Rc::new(InterpreterBackend::tracing()),
        Rc::new(MixedBackend::default()),
    ];
    for backend in backends {
        let mut env = Environment::new();
        let mut vm = Vm::with_backend(backend);
        assert_eq!(eval_in(&mut env, &mut vm, PROGRAM).unwrap(), expected);
    }
}

#[test]
fn backend_choice_is_per_function() {
    let backend = Rc::new(MixedBackend::default());
    let mut env = Environment::new();
    let mut vm = Vm::with_backend(backend.clone());
    eval_in(&mut env, &mut vm, PROGRAM).unwrap();

    let chosen = backend.chosen.borrow();
    // Program body, `make`, then the counter it returns.
    assert_eq!(
        *chosen,
        ["interpreter", "tracing-interpreter", "interpreter"]
    );
}
