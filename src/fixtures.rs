#[cfg(test)]
pub mod test {
    use std::path::PathBuf;

    use serde::Deserialize;
    use tempfile::TempDir;

    use crate::opt::Opt;

    /// Options of the `education` group used across tests.
    pub fn education_opts() -> Vec<Opt> {
        vec![
            Opt::string("school")
                .required(true)
                .default("bupt")
                .help("School the service reports for"),
            Opt::string("classes").default("grade 3").help("Class name"),
            Opt::integer("number-of-students")
                .default(50)
                .help("Number of students in a class"),
        ]
    }

    /// The `education` group deserialized as a struct.
    #[derive(Deserialize, Debug, PartialEq)]
    pub struct Education {
        pub school: String,
        pub classes: String,
        pub number_of_students: u32,
    }

    /// Write `content` to `dir/name` and return the path.
    pub fn conf_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn education_dests_match_struct_fields() {
        let opts = education_opts();
        let dests: Vec<&str> = opts.iter().map(Opt::dest_key).collect();
        assert_eq!(dests, ["school", "classes", "number_of_students"]);
    }
}
