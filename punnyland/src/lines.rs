//! Dad's canned lines

use rand::seq::SliceRandom;
use rand::Rng;

pub const DAD_FACTS: &[&str] = &[
    "Did you know? The average dad tells 3.2 jokes per day!",
    "Fun fact: Dad jokes are scientifically proven to build character!",
    "Did you know? 'Dad humor' is a genetic trait passed down through generations!",
    "Fun fact: The groan is the highest form of dad joke appreciation!",
    "Did you know? Dad jokes are like fine wine - they get better with age (and worse at the same time)!",
    "Fun fact: Studies show dad jokes reduce stress by 47%*! (*Study may not exist)",
    "Did you know? The dad joke was invented in 1847 by a father named Chuck Chuckle!",
    "Fun fact: Professional comedians are secretly jealous of dad joke mastery!",
    "Did you know? Dad jokes are the only jokes that improve when told repeatedly!",
    "Fun fact: The eye roll is actually a sign of deep appreciation for quality humor!",
    "Did you know? Dad jokes are considered a form of folk art in 17 countries!",
    "Fun fact: The best dad jokes are told while wearing socks with sandals!",
    "Did you know? Dad jokes have their own periodic table of elements: Punium (Pu)!",
    "Fun fact: Ancient cave paintings show dads telling jokes around campfires!",
    "Did you know? There's a secret dad joke university somewhere in Ohio!",
];

pub const DAD_SETUPS: &[&str] = &[
    "Alright, here we go...",
    "Oh, you're gonna love this one!",
    "This one's a real knee-slapper!",
    "Buckle up for this beauty!",
    "I've been saving this one just for you!",
    "This joke has been in the family for generations!",
    "Get ready to groan!",
    "This one's so good, it hurts!",
];

pub const FOLLOW_UPS: &[&str] = &[
    "See what I did there?",
    "That one gets 'em every time!",
    "I'll be here all week! Try the fish!",
    "Thank you, thank you, I'll see myself out!",
    "Your mom loves that joke!",
    "I'm not just funny, I'm dad funny!",
    "That joke has layers, like an onion!",
    "Classic dad material right there!",
];

pub const GROAN_RESPONSES: &[&str] = &[
    "That groan means it was a good one!",
    "The louder the groan, the better the joke!",
    "Your groans fuel my comedy fire!",
    "That's the sound of appreciation!",
    "Groaning is just applause for dads!",
    "Music to my ears!",
    "That groan says it all!",
    "Victory! Another successful dad joke!",
];

pub const DAILY_INTROS: &[&str] = &[
    "Good morning! Here's today's special joke!",
    "Rise and shine! Time for your daily dose of dad humor!",
    "Welcome to today's featured presentation!",
    "Today's joke of the day is brought to you by... me!",
    "Special delivery: one premium dad joke, hot off the press!",
];

const NAMED_SETUPS: &[&str] = &[
    "Hey {name}!",
    "Listen to this one, {name}!",
    "{name}, you're gonna love this!",
    "This one's for you, {name}!",
    "Alright {name}, ready?",
];

const ANONYMOUS_SETUPS: &[&str] = &[
    "Hey there!",
    "Listen to this one!",
    "You're gonna love this!",
    "Ready for this?",
    "Here's a good one!",
];

/// Random entry of `lines` (empty string for an empty slice)
pub fn pick<R: Rng + ?Sized>(rng: &mut R, lines: &[&'static str]) -> &'static str {
    lines.choose(rng).copied().unwrap_or("")
}

/// Opening line, personalized when the listener's name is known
pub fn setup_line<R: Rng + ?Sized>(rng: &mut R, name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => pick(rng, NAMED_SETUPS).replace("{name}", name),
        None => pick(rng, ANONYMOUS_SETUPS).to_string(),
    }
}
