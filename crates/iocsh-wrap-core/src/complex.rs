//! Complex numbers passed through string slots as `"<real> j <imag>"`.

use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

/// Separator between the real and imaginary part in shell input.
pub const INPUT_SEPARATOR: char = 'j';

/// A complex number with real and imaginary parts of type `T`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex<T> {
    pub re: T,
    pub im: T,
}

impl<T> Complex<T> {
    pub const fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
}

impl<T: FromStr> FromStr for Complex<T> {
    type Err = ConversionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = || ConversionError::MalformedComplex {
            input: input.to_owned(),
        };
        let (re, im) = input.split_once(INPUT_SEPARATOR).ok_or_else(malformed)?;
        let re = re.trim().parse().map_err(|_| malformed())?;
        let im = im.trim().parse().map_err(|_| malformed())?;
        Ok(Self { re, im })
    }
}

/// Formats in the shell input grammar, so the output parses back.
impl<T: fmt::Display> fmt::Display for Complex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.re, INPUT_SEPARATOR, self.im)
    }
}
