// SPDX-License-Identifier: GPL-3.0-or-later

//! ID3v1 genre table used to canonicalize genre strings from remote sources.

use crate::frame::join_string_list;

/// Number returned for names outside the table.
pub const UNKNOWN_GENRE: u8 = 255;

/// Genre names sorted alphabetically with their ID3v1 numbers.
static GENRES: &[(&str, u8)] = &[
    ("A Cappella", 123),
    ("Abstract", 148),
    ("Acid", 34),
    ("Acid Jazz", 74),
    ("Acid Punk", 73),
    ("Acoustic", 99),
    ("Alternative", 20),
    ("Alternative Rock", 40),
    ("Ambient", 26),
    ("Anime", 145),
    ("Art Rock", 149),
    ("Audio Theatre", 184),
    ("Audiobook", 183),
    ("Avantgarde", 90),
    ("Ballad", 116),
    ("Baroque", 150),
    ("Bass", 41),
    ("Beat", 135),
    ("Bebob", 85),
    ("Bhangra", 151),
    ("Big Band", 96),
    ("Big Beat", 152),
    ("Black Metal", 138),
    ("Bluegrass", 89),
    ("Blues", 0),
    ("Booty Bass", 107),
    ("Breakbeat", 153),
    ("BritPop", 132),
    ("Cabaret", 65),
    ("Celtic", 88),
    ("Chamber Music", 104),
    ("Chanson", 102),
    ("Chillout", 154),
    ("Chorus", 97),
    ("Christian Gangsta Rap", 136),
    ("Christian Rap", 61),
    ("Christian Rock", 141),
    ("Classic Rock", 1),
    ("Classical", 32),
    ("Club", 112),
    ("Club-House", 128),
    ("Comedy", 57),
    ("Contemporary Christian", 140),
    ("Country", 2),
    ("Crossover", 139),
    ("Cult", 58),
    ("Dance", 3),
    ("Dance Hall", 125),
    ("Darkwave", 50),
    ("Death Metal", 22),
    ("Disco", 4),
    ("Downtempo", 155),
    ("Dream", 55),
    ("Drum & Bass", 127),
    ("Drum Solo", 122),
    ("Dub", 156),
    ("Dubstep", 189),
    ("Duet", 120),
    ("EBM", 157),
    ("Easy Listening", 98),
    ("Eclectic", 158),
    ("Electro", 159),
    ("Electroclash", 160),
    ("Electronic", 52),
    ("Emo", 161),
    ("Ethnic", 48),
    ("Euro-House", 124),
    ("Euro-Techno", 25),
    ("Eurodance", 54),
    ("Experimental", 162),
    ("Folk", 80),
    ("Folk/Rock", 81),
    ("Folklore", 115),
    ("Freestyle", 119),
    ("Funk", 5),
    ("Fusion", 30),
    ("G-Funk", 188),
    ("Game", 36),
    ("Gangsta", 59),
    ("Garage", 163),
    ("Garage Rock", 190),
    ("Global", 164),
    ("Goa", 126),
    ("Gospel", 38),
    ("Gothic", 49),
    ("Gothic Rock", 91),
    ("Grunge", 6),
    ("Hard Rock", 79),
    ("Hardcore", 129),
    ("Heavy Metal", 137),
    ("Hip-Hop", 7),
    ("House", 35),
    ("Humour", 100),
    ("IDM", 165),
    ("Illbient", 166),
    ("Indie", 131),
    ("Indie Rock", 187),
    ("Industrial", 19),
    ("Industro-Goth", 167),
    ("Instrumental", 33),
    ("Instrumental Pop", 46),
    ("Instrumental Rock", 47),
    ("Jam Band", 168),
    ("Jazz", 8),
    ("Jazz+Funk", 29),
    ("Jpop", 146),
    ("Jungle", 63),
    ("Krautrock", 169),
    ("Latin", 86),
    ("Leftfield", 170),
    ("Lo-Fi", 71),
    ("Lounge", 171),
    ("Math Rock", 172),
    ("Meditative", 45),
    ("Merengue", 142),
    ("Metal", 9),
    ("Musical", 77),
    ("National Folk", 82),
    ("Native American", 64),
    ("Neoclassical", 182),
    ("Neue Deutsche Welle", 185),
    ("New Age", 10),
    ("New Romantic", 173),
    ("New Wave", 66),
    ("Noise", 39),
    ("Nu-Breakz", 174),
    ("Oldies", 11),
    ("Opera", 103),
    ("Other", 12),
    ("Podcast", 186),
    ("Polka", 75),
    ("Polsk Punk", 134),
    ("Pop", 13),
    ("Pop-Folk", 53),
    ("Pop/Funk", 62),
    ("Porn Groove", 109),
    ("Post-Punk", 175),
    ("Post-Rock", 176),
    ("Power Ballad", 117),
    ("Pranks", 23),
    ("Primus", 108),
    ("Progressive Rock", 92),
    ("Psybient", 191),
    ("Psychedelic", 67),
    ("Psychedelic Rock", 93),
    ("Psytrance", 177),
    ("Punk", 43),
    ("Punk Rock", 121),
    ("R&B", 14),
    ("Rap", 15),
    ("Rave", 68),
    ("Reggae", 16),
    ("Retro", 76),
    ("Revival", 87),
    ("Rhythmic Soul", 118),
    ("Rock", 17),
    ("Rock & Roll", 78),
    ("Salsa", 143),
    ("Samba", 114),
    ("Satire", 110),
    ("Shoegaze", 178),
    ("Showtunes", 69),
    ("Ska", 21),
    ("Slow Jam", 111),
    ("Slow Rock", 95),
    ("Sonata", 105),
    ("Soul", 42),
    ("Sound Clip", 37),
    ("Soundtrack", 24),
    ("Southern Rock", 56),
    ("Space", 44),
    ("Space Rock", 179),
    ("Speech", 101),
    ("Swing", 83),
    ("Symphonic Rock", 94),
    ("Symphony", 106),
    ("Synthpop", 147),
    ("Tango", 113),
    ("Techno", 18),
    ("Techno-Industrial", 51),
    ("Terror", 130),
    ("Thrash Metal", 144),
    ("Top 40", 60),
    ("Trailer", 70),
    ("Trance", 31),
    ("Tribal", 72),
    ("Trip-Hop", 27),
    ("Trop Rock", 180),
    ("Vocal", 28),
    ("World Music", 181),
    ("Worldbeat", 133),
];

/// ID3v1 number of an exactly matching genre name, [`UNKNOWN_GENRE`] otherwise.
pub fn number(name: &str) -> u8 {
    GENRES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, num)| *num)
        .unwrap_or(UNKNOWN_GENRE)
}

pub fn name(num: u8) -> Option<&'static str> {
    GENRES.iter().find(|(_, n)| *n == num).map(|(name, _)| *name)
}

/// Resolve "9", "(9)" or "(9)Metal" style references to a name.
pub fn name_string(value: &str) -> String {
    let numeric = if let Some(rest) = value.strip_prefix('(') {
        rest.find(')').filter(|pos| *pos > 0).map(|pos| &rest[..pos])
    } else {
        Some(value)
    };
    numeric
        .and_then(|n| n.parse::<u8>().ok())
        .and_then(name)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

/// Table names first in input order, then unknown names, joined as a string list.
pub fn canonical_list<I, S>(candidates: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut known = Vec::new();
    let mut custom = Vec::new();
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate.is_empty() {
            continue;
        }
        match name(number(candidate)) {
            Some(canonical) => known.push(canonical.to_string()),
            None => custom.push(candidate.to_string()),
        }
    }
    known.extend(custom);
    join_string_list(known)
}
