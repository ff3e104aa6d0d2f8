/// The executable to run and the arguments it always gets.
/// Fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Used in log and list-file names
    pub name: String,
    pub exe: String,
    pub fixed_args: Vec<String>,
}

impl ToolSpec {
    /// `args` is split on whitespace.
    pub fn new(name: &str, exe: &str, args: &str) -> Self {
        Self {
            name: name.to_owned(),
            exe: exe.to_owned(),
            fixed_args: args.split_whitespace().map(str::to_owned).collect(),
        }
    }
}
