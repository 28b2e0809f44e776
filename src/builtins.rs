use std::collections::HashMap;
use std::rc::Rc;

use crate::interpreter::{type_name, Value};

/// Builtin functions receive the already-evaluated arguments and answer
/// with a value or a message; the interpreter collapses any failure into
/// a single opaque builtin error.
pub type BuiltinFn = for<'a> fn(&[Value<'a>]) -> Result<Value<'a>, String>;

/// Name → function registry, resolved before user definitions on every
/// call. The host may register additional entries before execution.
pub struct Builtins {
    table: HashMap<String, BuiltinFn>,
}

impl Builtins {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// The core set every embedding gets.
    pub fn core() -> Self {
        let mut builtins = Self::empty();
        builtins.register("print", builtin_print);
        builtins.register("len", builtin_len);
        builtins.register("str", builtin_str);
        builtins.register("int", builtin_int);
        builtins.register("float", builtin_float);
        builtins.register("type", builtin_type);
        builtins.register("range", builtin_range);
        builtins
    }

    pub fn register(&mut self, name: &str, func: BuiltinFn) {
        self.table.insert(name.to_string(), func);
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.table.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::core()
    }
}

fn builtin_print<'a>(args: &[Value<'a>]) -> Result<Value<'a>, String> {
    let rendered: Vec<String> = args.iter().map(|value| value.to_string()).collect();
    println!("{}", rendered.join(" "));
    Ok(Value::None)
}

fn builtin_len<'a>(args: &[Value<'a>]) -> Result<Value<'a>, String> {
    if args.len() != 1 {
        return Err(format!("expects exactly 1 argument, received {}", args.len()));
    }
    let length = match &args[0] {
        Value::Str(bytes) => bytes.len(),
        Value::List(items) => items.borrow().len(),
        Value::Dict(entries) => entries.borrow().len(),
        other => return Err(format!("object of type {} has no length", type_name(other))),
    };
    Ok(Value::Int(length as i64))
}

fn builtin_str<'a>(args: &[Value<'a>]) -> Result<Value<'a>, String> {
    if args.len() != 1 {
        return Err(format!("expects exactly 1 argument, received {}", args.len()));
    }
    Ok(Value::Str(Rc::new(args[0].to_string().into_bytes())))
}

fn builtin_int<'a>(args: &[Value<'a>]) -> Result<Value<'a>, String> {
    if args.len() != 1 {
        return Err(format!("expects exactly 1 argument, received {}", args.len()));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(x) => Ok(Value::Int(x.trunc() as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("cannot convert '{}' to int", text))
        }
        other => Err(format!("cannot convert {} to int", type_name(other))),
    }
}

fn builtin_float<'a>(args: &[Value<'a>]) -> Result<Value<'a>, String> {
    if args.len() != 1 {
        return Err(format!("expects exactly 1 argument, received {}", args.len()));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Str(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            text.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("cannot convert '{}' to float", text))
        }
        other => Err(format!("cannot convert {} to float", type_name(other))),
    }
}

fn builtin_type<'a>(args: &[Value<'a>]) -> Result<Value<'a>, String> {
    if args.len() != 1 {
        return Err(format!("expects exactly 1 argument, received {}", args.len()));
    }
    Ok(Value::str_from(type_name(&args[0])))
}

/// range(end), range(start, end) or range(start, end, step); produces a
/// list of integers.
fn builtin_range<'a>(args: &[Value<'a>]) -> Result<Value<'a>, String> {
    fn int_arg(value: &Value<'_>) -> Result<i64, String> {
        match value {
            Value::Int(n) => Ok(*n),
            other => Err(format!("expects integer arguments, found {}", type_name(other))),
        }
    }

    let (start, end, step) = match args.len() {
        1 => (0, int_arg(&args[0])?, 1),
        2 => (int_arg(&args[0])?, int_arg(&args[1])?, 1),
        3 => (int_arg(&args[0])?, int_arg(&args[1])?, int_arg(&args[2])?),
        received => {
            return Err(format!(
                "expects between 1 and 3 arguments, received {}",
                received
            ))
        }
    };
    if step == 0 {
        return Err("step must not be zero".to_string());
    }

    let mut values = Vec::new();
    let mut current = start;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        values.push(Value::Int(current));
        current += step;
    }
    Ok(Value::list_from(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ints(value: Value<'_>) -> Vec<i64> {
        match value {
            Value::List(items) => items
                .borrow()
                .iter()
                .map(|item| match item {
                    Value::Int(n) => *n,
                    other => panic!("expected int, got {:?}", other),
                })
                .collect(),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn len_counts_bytes_elements_and_entries() {
        let list = Value::list_from(vec![Value::Int(1), Value::Int(2)]);
        assert!(matches!(builtin_len(&[list]), Ok(Value::Int(2))));

        let text = Value::str_from("hé");
        // Byte length, not character count.
        assert!(matches!(builtin_len(&[text]), Ok(Value::Int(3))));

        assert!(builtin_len(&[Value::Int(3)]).is_err());
    }

    #[test]
    fn str_renders_values() {
        let result = builtin_str(&[Value::Int(42)]);
        match result {
            Ok(Value::Str(bytes)) => assert_eq!(bytes.as_slice(), b"42"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn int_truncates_and_parses() {
        assert!(matches!(
            builtin_int(&[Value::Float(3.9)]),
            Ok(Value::Int(3))
        ));
        assert!(matches!(
            builtin_int(&[Value::Float(-3.9)]),
            Ok(Value::Int(-3))
        ));
        assert!(matches!(
            builtin_int(&[Value::str_from(" 17 ")]),
            Ok(Value::Int(17))
        ));
        assert!(builtin_int(&[Value::str_from("x")]).is_err());
    }

    #[test]
    fn range_covers_all_arities() {
        assert_eq!(
            ints(builtin_range(&[Value::Int(4)]).expect("range(4)")),
            vec![0, 1, 2, 3]
        );
        assert_eq!(
            ints(builtin_range(&[Value::Int(2), Value::Int(5)]).expect("range(2, 5)")),
            vec![2, 3, 4]
        );
        assert_eq!(
            ints(
                builtin_range(&[Value::Int(5), Value::Int(0), Value::Int(-2)])
                    .expect("range(5, 0, -2)")
            ),
            vec![5, 3, 1]
        );
        assert!(builtin_range(&[Value::Int(1), Value::Int(2), Value::Int(0)]).is_err());
    }

    #[test]
    fn type_names_match_the_value_model() {
        let cases: Vec<(Value<'_>, &[u8])> = vec![
            (Value::Int(1), b"int"),
            (Value::Float(1.0), b"float"),
            (Value::Bool(true), b"bool"),
            (Value::None, b"none"),
            (Value::str_from(""), b"str"),
            (Value::list_from(Vec::new()), b"list"),
        ];
        for (value, expected) in cases {
            match builtin_type(&[value]) {
                Ok(Value::Str(bytes)) => assert_eq!(bytes.as_slice(), expected),
                other => panic!("expected string, got {:?}", other),
            }
        }
    }
}
