//! Shell-visible function descriptors.

use std::borrow::Cow;

use crate::error::BuildError;
use crate::kind::{ArgType, ParameterKind};
use crate::native_fn::NativeFunction;

/// Largest arity a wrapped function may have.
pub const MAX_ARITY: usize = 10;

/// Name and kind of one shell argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentDescriptor {
    name: String,
    kind: ParameterKind,
}

impl ArgumentDescriptor {
    /// Describe an argument of `kind`, named `name` or the kind's label.
    pub fn describe(kind: ParameterKind, name: Option<&str>) -> Self {
        let name = match name {
            Some(name) => name.to_owned(),
            None => kind.label().into_owned(),
        };
        Self { name, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn arg_type(&self) -> ArgType {
        self.kind.arg_type()
    }
}

/// A command name plus its ordered argument descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionDescriptor {
    name: String,
    arguments: Vec<ArgumentDescriptor>,
}

impl FunctionDescriptor {
    /// Build the descriptor for `F`.
    ///
    /// `help` renames arguments in order; surplus entries are ignored and
    /// arguments without one keep their default label. The result comes from
    /// [`FunctionDescriptorBuilder::release`], so a descriptor is never
    /// handed out with an unfilled slot.
    pub fn describe<F, M>(name: &str, help: &[&str]) -> Result<Self, BuildError>
    where
        F: NativeFunction<M>,
    {
        let parameters = F::parameters();
        let mut builder = FunctionDescriptorBuilder::begin(name, parameters.len());
        for (index, param) in parameters.iter().enumerate() {
            let name = help.get(index).copied();
            builder.set_argument(index, ArgumentDescriptor::describe(param.kind, name));
        }
        if help.len() > parameters.len() {
            tracing::debug!(
                target: "iocsh_wrap",
                function = name,
                surplus = help.len() - parameters.len(),
                "ignoring surplus help strings"
            );
        }
        builder.release()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[ArgumentDescriptor] {
        &self.arguments
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    /// The shell tags of every argument, in order.
    pub fn arg_types(&self) -> impl Iterator<Item = ArgType> + '_ {
        self.arguments.iter().map(ArgumentDescriptor::arg_type)
    }

    /// A one-line usage summary, e.g. `myFunc <i32> "second name"`.
    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        for argument in &self.arguments {
            usage.push(' ');
            let name: Cow<'_, str> = if argument.name.contains(char::is_whitespace) {
                Cow::Owned(format!("\"{}\"", argument.name))
            } else {
                Cow::Borrowed(&argument.name)
            };
            usage.push_str(&name);
        }
        usage
    }
}

/// Incrementally assembles a [`FunctionDescriptor`].
///
/// Nothing is handed out until [`release`](Self::release) succeeds; dropping
/// an unreleased builder frees everything it holds.
#[derive(Debug)]
pub struct FunctionDescriptorBuilder {
    name: String,
    slots: Vec<Option<ArgumentDescriptor>>,
}

impl FunctionDescriptorBuilder {
    /// Start a descriptor with `arity` empty argument slots.
    pub fn begin(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            slots: vec![None; arity],
        }
    }

    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// Fill slot `index`; an out-of-range index is ignored.
    pub fn set_argument(&mut self, index: usize, argument: ArgumentDescriptor) -> &mut Self {
        match self.slots.get_mut(index) {
            Some(slot) => *slot = Some(argument),
            None => tracing::debug!(
                target: "iocsh_wrap",
                function = %self.name,
                index,
                arity = self.slots.len(),
                "ignoring out-of-range argument descriptor"
            ),
        }
        self
    }

    /// Finish the descriptor.
    pub fn release(self) -> Result<FunctionDescriptor, BuildError> {
        let mut arguments = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Some(argument) => arguments.push(argument),
                None => {
                    return Err(BuildError::MissingArgument {
                        function: self.name,
                        index,
                    });
                }
            }
        }
        Ok(FunctionDescriptor {
            name: self.name,
            arguments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Complex;

    fn int32() -> ParameterKind {
        ParameterKind::Int {
            bits: 32,
            signed: true,
        }
    }

    fn mixed(_: i32, _: &mut String, _: f64, _: Complex<f64>) {}

    #[test]
    fn describe_uses_label_or_override() {
        let arg = ArgumentDescriptor::describe(int32(), None);
        assert_eq!(arg.name(), "<i32>");
        assert_eq!(arg.arg_type(), ArgType::Int);
        let arg = ArgumentDescriptor::describe(ParameterKind::Float { bits: 32 }, Some("gain"));
        assert_eq!(arg.name(), "gain");
        assert_eq!(arg.arg_type(), ArgType::Double);
    }

    #[test]
    fn builder_ignores_out_of_range() {
        let mut builder = FunctionDescriptorBuilder::begin("f", 1);
        builder
            .set_argument(5, ArgumentDescriptor::describe(int32(), Some("ghost")))
            .set_argument(0, ArgumentDescriptor::describe(int32(), None));
        let descriptor = builder.release().unwrap();
        assert_eq!(descriptor.arity(), 1);
        assert_eq!(descriptor.arguments()[0].name(), "<i32>");
    }

    #[test]
    fn builder_rejects_missing_slot() {
        let mut builder = FunctionDescriptorBuilder::begin("f", 2);
        builder.set_argument(1, ArgumentDescriptor::describe(int32(), None));
        let err = builder.release().unwrap_err();
        assert_eq!(
            err,
            BuildError::MissingArgument {
                function: "f".into(),
                index: 0
            }
        );
        assert!(err.to_string().contains("argument 0"));
    }

    #[test]
    fn describe_function_with_partial_help() {
        let descriptor = describe_fn("mixed", mixed, &["count", "label"]);
        assert_eq!(descriptor.name(), "mixed");
        let names: Vec<_> = descriptor.arguments().iter().map(ArgumentDescriptor::name).collect();
        assert_eq!(names, vec!["count", "label", "<f64>", "<complex>"]);
        let tags: Vec<_> = descriptor.arg_types().collect();
        assert_eq!(tags, vec![ArgType::Int, ArgType::String, ArgType::Double, ArgType::String]);
    }

    #[test]
    fn surplus_help_is_ignored() {
        fn one(_: u8) {}
        let descriptor = describe_fn("one", one, &["a", "b", "c"]);
        assert_eq!(descriptor.arity(), 1);
        assert_eq!(descriptor.arguments()[0].name(), "a");
    }

    #[test]
    fn describing_twice_is_identical() {
        let first = describe_fn("mixed", mixed, &["x"]);
        let second = describe_fn("mixed", mixed, &["x"]);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_arity() {
        fn nothing() {}
        let descriptor = describe_fn("nothing", nothing, &[]);
        assert_eq!(descriptor.arity(), 0);
        assert_eq!(descriptor.usage(), "nothing");
    }

    #[test]
    fn usage_quotes_names_with_spaces() {
        fn two(_: i32, _: f32) {}
        let descriptor = describe_fn("two", two, &["first arg"]);
        assert_eq!(descriptor.usage(), "two \"first arg\" <f32>");
    }

    #[test]
    fn describe_matches_released_builder() {
        let mut builder = FunctionDescriptorBuilder::begin("mixed", 4);
        builder
            .set_argument(3, ArgumentDescriptor::describe(ParameterKind::Complex { bits: 64 }, None))
            .set_argument(2, ArgumentDescriptor::describe(ParameterKind::Float { bits: 64 }, None))
            .set_argument(1, ArgumentDescriptor::describe(ParameterKind::StringByRef, Some("label")))
            .set_argument(0, ArgumentDescriptor::describe(int32(), Some("count")));
        let expected = builder.release().unwrap();
        assert_eq!(
            FunctionDescriptor::describe::<fn(i32, &mut String, f64, Complex<f64>), _>("mixed", &["count", "label"]),
            Ok(expected)
        );
    }

    fn describe_fn<F: NativeFunction<M>, M>(name: &str, _: F, help: &[&str]) -> FunctionDescriptor {
        FunctionDescriptor::describe::<F, M>(name, help).unwrap()
    }
}
