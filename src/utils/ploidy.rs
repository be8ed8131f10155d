use std::{fmt, str::FromStr};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Ploidy {
    One,
    Two,
}

impl Ploidy {
    pub fn copies(&self) -> usize {
        match self {
            Ploidy::One => 1,
            Ploidy::Two => 2,
        }
    }
}

impl FromStr for Ploidy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Ploidy::One),
            "2" => Ok(Ploidy::Two),
            _ => Err(format!("ploidy must be set to 1 or 2, got '{}'", s)),
        }
    }
}

impl fmt::Display for Ploidy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.copies())
    }
}
