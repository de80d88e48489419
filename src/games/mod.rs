pub mod invaders;
pub mod memory;

pub struct GameDescriptor
{
    pub name: &'static str,
    pub description: &'static str,
}

pub fn registry() -> Vec<GameDescriptor>
{
    vec![GameDescriptor {
        name: "memory",
        description: "Matching pairs with a flip-and-match board",
    },
    GameDescriptor {
        name: "invaders",
        description: "Grid shooter with a single roaming hostile",
    }]
}
