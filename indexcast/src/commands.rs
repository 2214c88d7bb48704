use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("indexcast")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("indexcast")
        .about("Crawl sitemaps, ping blog update services and submit URLs to IndexNow")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress progress and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" ... "Log more detail (-v info, -vv debug)")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .help("Path to the JSON site list")
                .default_value("~/.config/indexcast/sites.json")
                .global(true),
        )
        .arg(
            arg!(-s --"storage" <PATH>)
                .required(false)
                .help("Directory holding the per-domain URL cache")
                .default_value("~/.config/indexcast/storage")
                .global(true),
        )
        .arg(
            arg!(--"site" <DOMAIN>)
                .required(false)
                .help("Only process the configured site with this domain")
                .global(true),
        )
        .arg(
            arg!(--"format" <FORMAT>)
                .required(false)
                .help("End-of-run report format: text, json")
                .value_parser(["text", "json"])
                .default_value("text")
                .global(true),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Per-request timeout in seconds")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("10")
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("init")
                .about("Writes a sample site list to your config directory")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to write sites.json into")
                        .default_value("~/.config/indexcast/"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing sites.json at the target location")
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl").about(
                "Resolve every site's sitemaps to page URLs and replace its cached URL \
                snapshot.",
            ),
        )
        .subcommand(
            command!("ping")
                .about("Send XML-RPC weblogUpdates pings to every site's configured services."),
        )
        .subcommand(
            command!("submit")
                .about("Submit every site's cached URLs to the IndexNow search engines.")
                .arg(
                    arg!(-t --"threads" <NUM_REQUESTS>)
                        .required(false)
                        .help("The number of submissions kept in flight at once.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_definition_is_valid() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = command_argument_builder()
            .try_get_matches_from([
                "indexcast",
                "submit",
                "--threads",
                "4",
                "--site",
                "example.com",
                "--format",
                "json",
                "-q",
            ])
            .unwrap();

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "submit");
        assert_eq!(sub.get_one::<usize>("threads"), Some(&4));
        assert_eq!(sub.get_one::<String>("site").map(String::as_str), Some("example.com"));
        assert_eq!(sub.get_one::<String>("format").map(String::as_str), Some("json"));
        assert!(sub.get_flag("quiet"));
        assert_eq!(sub.get_one::<u64>("timeout"), Some(&10));
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result =
            command_argument_builder().try_get_matches_from(["indexcast", "crawl", "--format", "csv"]);
        assert!(result.is_err());
    }
}
