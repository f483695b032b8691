mod dynamic;
mod facade;
mod shapes;
