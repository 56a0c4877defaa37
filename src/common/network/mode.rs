use enumset::EnumSetType;

/// Which side of the connection a world (and its data) lives on.
#[derive(Debug, EnumSetType, Hash)]
pub enum Kind {
	Client,
	Server,
}

impl std::fmt::Display for Kind {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Client => write!(f, "Client"),
			Self::Server => write!(f, "Server"),
		}
	}
}
