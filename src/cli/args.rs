use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "masjid", version, author, about = "Mosque directory and prayer-time administration")]
pub struct Cli {
    /// Use this database file instead of the default one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mosque directory: register, approve, search
    Mosque {
        #[command(subcommand)]
        action: MosqueCommands,
    },
    /// Daily prayer-time schedules
    Times {
        #[command(subcommand)]
        action: TimesCommands,
    },
    /// Mosque announcements
    Announce {
        #[command(subcommand)]
        action: AnnounceCommands,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct MosqueArg {
    /// Mosque id (defaults to the active mosque)
    #[arg(long, short)]
    pub mosque: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MosqueDateArgs {
    #[command(flatten)]
    pub mosque: MosqueArg,
    /// Calendar date, YYYY-MM-DD (defaults to today)
    #[arg(long, short)]
    pub date: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum MosqueCommands {
    /// Register a new mosque (hidden until approved)
    Register {
        name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long, default_value = "")]
        state: String,
        #[arg(long, default_value = "")]
        country: String,
        /// Shafi'i, Hanafi, Maliki, Hanbali or Other
        #[arg(long, default_value = "Other")]
        school: String,
        /// Repeat for each facility
        #[arg(long = "facility")]
        facilities: Vec<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        image: Option<String>,
        /// Google Maps link to take coordinates from
        #[arg(long)]
        map_link: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
    },
    /// Change a mosque's listing details
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long = "facility")]
        facilities: Vec<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
    /// Make a registered mosque visible in the directory
    Approve { id: String },
    /// Public page of an approved mosque: details, today's times, announcements
    Show { id: String },
    /// Full record of any registration, approved or not
    Inspect { id: String },
    /// Star or unstar a mosque
    Favorite { id: String },
    /// List starred mosques
    Favorites,
    /// Search approved mosques by name, address or city
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        school: Option<String>,
    },
    /// Approved mosques near a point
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Radius in km (defaults to the configured radius)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Set the mosque that schedule and announcement commands act on
    Use { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TimesCommands {
    /// Show the schedule for a date
    Show {
        #[command(flatten)]
        target: MosqueDateArgs,
    },
    /// Create or edit the schedule for a date
    Set {
        #[command(flatten)]
        target: MosqueDateArgs,
        /// ADHAN/IQAMAH, e.g. 05:15/05:30
        #[arg(long)]
        fajr: Option<String>,
        #[arg(long)]
        dhuhr: Option<String>,
        #[arg(long)]
        asr: Option<String>,
        #[arg(long)]
        maghrib: Option<String>,
        #[arg(long)]
        isha: Option<String>,
        /// KHUTBAH/PRAYER
        #[arg(long)]
        jummah: Option<String>,
        /// Start from the previous day's times (only for dates with no schedule)
        #[arg(long)]
        copy_prev: bool,
    },
    /// Copy the previous day's schedule onto a date that has none
    CopyPrev {
        #[command(flatten)]
        target: MosqueDateArgs,
    },
    /// Remove the schedule for a date
    Delete {
        #[command(flatten)]
        target: MosqueDateArgs,
    },
    /// Show the next upcoming prayer today
    Next {
        #[command(flatten)]
        mosque: MosqueArg,
        /// Pretend the time is HH:MM
        #[arg(long)]
        at: Option<String>,
    },
    /// Print every schedule of a mosque as JSON
    Export {
        #[command(flatten)]
        mosque: MosqueArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum AnnounceCommands {
    /// List announcements, newest first
    List {
        #[command(flatten)]
        mosque: MosqueArg,
        /// Include expired announcements
        #[arg(long)]
        all: bool,
    },
    /// Post an announcement
    Add {
        #[command(flatten)]
        mosque: MosqueArg,
        title: String,
        content: String,
        /// general, event, eid or ramadan
        #[arg(long = "type", default_value = "general")]
        kind: String,
        /// Last day to show it, YYYY-MM-DD
        #[arg(long)]
        expires: Option<String>,
        #[arg(long)]
        event_date: Option<String>,
        #[arg(long)]
        event_time: Option<String>,
    },
    /// Edit an announcement
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        expires: Option<String>,
        #[arg(long)]
        event_date: Option<String>,
        #[arg(long)]
        event_time: Option<String>,
    },
    /// Delete an announcement
    Delete { id: String },
}
