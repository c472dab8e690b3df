use clap::Parser;

/// Population by age and voting influence of the municipalities of a prefecture.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the analysis: data source, selection and
    /// partition scheme. See the manual of the voting_influence crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, vinfl will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the
    /// given location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The population table. Setting this option overrides the file that may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (xlsx or csv) The type of the input. By default, it is guessed from the extension of the file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use (default: the first one).
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// The prefecture to analyse, for example 三重県.
    #[clap(short, long, value_parser)]
    pub prefecture: Option<String>,

    /// (list of codes or not specified) The municipalities to analyse. All the municipalities of the
    /// prefecture are used if not specified.
    #[clap(long, value_parser)]
    pub codes: Option<Vec<String>>,

    /// (eligible_voters or youth_and_adults) The partition of the ages into cohorts.
    #[clap(long, value_parser)]
    pub scheme: Option<String>,

    /// (file path) The coordinates of the municipalities, to produce the map section.
    #[clap(long, value_parser)]
    pub coordinates: Option<String>,

    /// (総人口, 20歳未満, 30-60代 or 70歳以上) What the size of the map markers shows (default: 総人口,
    /// the reported total population).
    #[clap(long, value_parser)]
    pub map_indicator: Option<String>,

    /// If passed as an argument, lists the prefectures (or the municipalities of the selected prefecture)
    /// instead of running the analysis.
    #[clap(long, takes_value = false)]
    pub list: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
