//! Compiled-in party menu shared by the client catalog and the backend.

use crate::domain::DishId;

pub const DEFAULT_DISH_CAPACITY: u32 = 7;

pub const DEFAULT_MENU: &[(i64, &str)] = &[
    (1, "Almôndegas com mandioca"),
    (2, "Torresmo"),
    (3, "Calabresa frita"),
    (4, "Batata frita"),
    (5, "Carne de sol frita"),
    (6, "Caldos"),
    (7, "Pastéis"),
    (8, "Churrasquinho"),
    (9, "Frango a passarinho"),
    (10, "Linguiça acebolada"),
    (11, "Cachorro quente"),
    (12, "Mandioca frita"),
    (
        13,
        "Frios (mussarela, presunto, mortadela, ovos de codorna, azeitona, salsicha, palmito, salaminho)",
    ),
    (14, "Bolinho de arroz"),
    (15, "Bolinho de bacalhau"),
    (16, "Camarão"),
    (17, "Tilápia frita"),
    (18, "Kibe"),
];

pub fn default_dish_id(name: &str) -> Option<DishId> {
    DEFAULT_MENU
        .iter()
        .find(|(_, dish)| *dish == name)
        .map(|(id, _)| DishId(*id))
}
