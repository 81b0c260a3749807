//! Dot entity and population generation

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{hex_to_rgb, spherical_to_cartesian};

pub const PALETTE: [&str; 20] = [
    "#ff6b6b", "#ee5a24", "#f0932b", "#f6e58d", "#badc58", "#6ab04c", "#00d2d3", "#54a0ff",
    "#5f27cd", "#c44569", "#ff9ff3", "#feca57", "#1dd1a1", "#48dbfb", "#ff6348", "#a29bfe",
    "#fd79a8", "#00cec9", "#e17055", "#74b9ff",
];

pub const VIBES: [&str; 6] = ["serene", "warm", "electric", "midnight", "golden", "arctic"];

const NAMES: [&str; 99] = [
    "kai", "luna", "sage", "river", "ember", "nova", "wren", "atlas", "iris", "orion", "maya",
    "felix", "jade", "leo", "cleo", "milo", "aria", "sol", "zara", "finn", "rosa", "alex", "eden",
    "juno", "theo", "lila", "omar", "noa", "sky", "ren", "nina", "cole", "ivy", "max", "eva",
    "sam", "drew", "jules", "rain", "ash", "liv", "nell", "kira", "tao", "vera", "nico", "lea",
    "otto", "mara", "yuki", "zoe", "remy", "alba", "lars", "faye", "moss", "cora", "beau", "esme",
    "kit", "opal", "rhys", "tess", "wolf", "ari", "cruz", "dara", "elio", "gael", "hana", "idris",
    "jace", "lark", "mika", "suki", "bria", "yael", "lux", "asa", "rue", "lyra", "cass", "moe",
    "pax", "zia", "jin", "uri", "dag", "pip", "neo", "aya", "zen", "ike", "oak", "cal", "emi",
    "jan", "lex", "val",
];

const PHRASES: [&str; 22] = [
    "building something nobody asked for",
    "running on coffee and vibes",
    "probably outside",
    "lost in a rabbit hole",
    "making things that glow",
    "somewhere between here and there",
    "collecting sunsets",
    "too many browser tabs",
    "chasing the feeling",
    "learning to slow down",
    "night owl energy",
    "garden variety human",
    "thinking about the ocean",
    "always curious never bored",
    "one more commit",
    "permanent beginner",
    "overwatering my plants",
    "forgetting to eat lunch",
    "museum legs",
    "in my reading era",
    "half-finished playlists",
    "3am ideas",
];

/// Shell radius range for generated/seeded homes
pub const HOME_SHELL: (f32, f32) = (20.0, 100.0);
/// Shell radius range for user-created dots (closer to the core)
pub const CREATED_SHELL: (f32, f32) = (15.0, 35.0);

/// Node record as delivered by the external galaxy source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalaxyDot {
    pub id: String,
    pub name: String,
    pub color: String,
    pub line: String,
    #[serde(default)]
    pub vibe: Option<String>,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Input used to seed or create a dot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DotSeed {
    pub name: String,
    pub color: String,
    pub line: String,
    #[serde(default)]
    pub vibe: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    /// External identifier, if the dot already exists upstream
    #[serde(default)]
    pub slug: Option<String>,
    /// Seed coordinates; a random shell position is used when absent
    #[serde(default)]
    pub position: Option<Vec3>,
}

impl From<GalaxyDot> for DotSeed {
    fn from(dot: GalaxyDot) -> Self {
        Self {
            name: dot.name,
            color: dot.color,
            line: dot.line,
            vibe: dot.vibe,
            theme: None,
            link: None,
            slug: Some(dot.id),
            position: Some(Vec3::new(dot.x, dot.y, dot.z)),
        }
    }
}

/// One simulated node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dot {
    pub name: String,
    pub line: String,
    /// Hex color as supplied
    pub color: String,
    /// Parsed 0-1 RGB of `color`
    #[serde(skip)]
    pub rgb: Vec3,
    pub vibe: String,
    pub theme: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub claimed: bool,
    /// Rest position the spring pulls toward
    pub home: Vec3,
    pub pos: Vec3,
    pub vel: Vec3,
    /// Indices into the live dot array (directed edges)
    pub friends: Vec<usize>,
    /// Position driven by pointer while true
    #[serde(skip)]
    pub grabbed: bool,
}

impl Dot {
    /// Dot resting at `home`
    pub fn new(seed: DotSeed, home: Vec3) -> Self {
        let rgb = hex_to_rgb(&seed.color);
        Self {
            name: seed.name,
            line: seed.line,
            color: seed.color,
            rgb,
            vibe: seed.vibe.unwrap_or_else(|| "serene".to_string()),
            theme: seed.theme.unwrap_or_else(|| "default".to_string()),
            link: seed.link.filter(|l| !l.trim().is_empty()),
            slug: seed.slug,
            claimed: false,
            home,
            pos: home,
            vel: Vec3::ZERO,
            friends: Vec::new(),
            grabbed: false,
        }
    }

    /// Whether `index` is one of this dot's friends
    pub fn has_friend(&self, index: usize) -> bool {
        self.friends.contains(&index)
    }

    /// Size multiplier from connection count
    pub fn connection_scale(&self) -> f32 {
        (self.friends.len() as f32 / 5.0).min(1.5)
    }

    /// Base brightness from connection count
    pub fn base_brightness(&self) -> f32 {
        0.7 + (self.friends.len() as f32 / 8.0).min(0.6)
    }
}

/// Whether `a -> b` is mirrored by `b -> a`. Out-of-range indices are never mutual.
pub fn is_mutual(dots: &[Dot], a: usize, b: usize) -> bool {
    dots.get(b).is_some_and(|other| other.has_friend(a))
}

/// Uniform random point on a spherical shell
pub fn random_shell_point<R: Rng>(rng: &mut R, shell: (f32, f32)) -> Vec3 {
    let theta = rng.random::<f32>() * std::f32::consts::TAU;
    let phi = (2.0 * rng.random::<f32>() - 1.0).acos();
    let r = shell.0 + rng.random::<f32>() * (shell.1 - shell.0);
    spherical_to_cartesian(r, theta, phi)
}

/// Push `count` random friend indices in `0..len` onto `dot`, skipping `skip`
pub fn assign_random_friends<R: Rng>(
    rng: &mut R,
    dot: &mut Dot,
    count: usize,
    len: usize,
    skip: Option<usize>,
) {
    if len == 0 {
        return;
    }
    for _ in 0..count {
        let fi = rng.random_range(0..len);
        if Some(fi) != skip {
            dot.friends.push(fi);
        }
    }
}

/// Generate a random population with 1-3 friends per dot
pub fn generate_dots<R: Rng>(rng: &mut R, count: usize) -> Vec<Dot> {
    let mut dots: Vec<Dot> = (0..count)
        .map(|i| {
            let home = random_shell_point(rng, HOME_SHELL);
            let seed = DotSeed {
                name: NAMES[i % NAMES.len()].to_string(),
                color: PALETTE[rng.random_range(0..PALETTE.len())].to_string(),
                line: PHRASES[rng.random_range(0..PHRASES.len())].to_string(),
                vibe: Some(VIBES[rng.random_range(0..VIBES.len())].to_string()),
                ..Default::default()
            };
            Dot::new(seed, home)
        })
        .collect();

    let len = dots.len();
    for (i, dot) in dots.iter_mut().enumerate() {
        let n = rng.random_range(1..=3);
        assign_random_friends(rng, dot, n, len, Some(i));
    }

    dots
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_generated_dots_on_shell() {
        let mut rng = Pcg32::seed_from_u64(7);
        let dots = generate_dots(&mut rng, 100);
        assert_eq!(dots.len(), 100);
        for (i, dot) in dots.iter().enumerate() {
            let r = dot.home.length();
            assert!(r >= HOME_SHELL.0 - 0.001 && r <= HOME_SHELL.1 + 0.001);
            assert_eq!(dot.pos, dot.home);
            assert!(dot.friends.len() <= 3);
            assert!(!dot.has_friend(i));
            assert!(dot.friends.iter().all(|&f| f < dots.len()));
        }
    }

    #[test]
    fn test_mutual_detection() {
        let mut a = Dot::new(DotSeed::default(), Vec3::ZERO);
        let mut b = Dot::new(DotSeed::default(), Vec3::X);
        a.friends.push(1);
        b.friends.push(0);
        let c = Dot::new(DotSeed::default(), Vec3::Y);
        let mut dots = vec![a, b, c];
        dots[2].friends.push(0);
        assert!(is_mutual(&dots, 0, 1));
        assert!(!is_mutual(&dots, 2, 0));
        assert!(!is_mutual(&dots, 0, 9));
    }

    #[test]
    fn test_galaxy_dot_decodes() {
        let json = r##"[{"id":"abc","name":"kai","color":"#ff6b6b","line":"hi","x":1,"y":2,"z":3}]"##;
        let parsed: Vec<GalaxyDot> = serde_json::from_str(json).unwrap();
        let seed = DotSeed::from(parsed[0].clone());
        assert_eq!(seed.slug.as_deref(), Some("abc"));
        assert_eq!(seed.position, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(seed.vibe.is_none());
    }
}
